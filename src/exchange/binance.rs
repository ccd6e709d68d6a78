use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ExchangeClient, RateLimiter, RawCandle};
use crate::domain::Timeframe;

/// REST limits/weights, grounded on the teacher's `config::binance::BinanceConfig`
/// constants (klines weight, weight-limit-per-minute, base URLs).
pub struct BinanceLimits {
    pub klines_limit: u32,
    pub weight_limit_per_minute: u32,
    pub kline_call_weight: u32,
}

impl Default for BinanceLimits {
    fn default() -> Self {
        Self {
            klines_limit: 1000,
            weight_limit_per_minute: 6000,
            kline_call_weight: 2,
        }
    }
}

/// A thin REST adapter over Binance's public market-data endpoints. The
/// exchange client is an external collaborator per spec §1; this is the
/// one concrete implementation, kept deliberately small — no websocket
/// streaming, no private/signed endpoints, since the core only needs
/// `fetch_ohlcv`/`fetch_ticker` (spec §6).
pub struct BinanceClient {
    http: reqwest::Client,
    base_url: String,
    limits: BinanceLimits,
    rate_limiter: RateLimiter,
}

impl BinanceClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let limits = BinanceLimits::default();
        let rate_limiter = RateLimiter::new(limits.weight_limit_per_minute);
        Ok(Self {
            http,
            base_url: "https://api.binance.com".to_string(),
            limits,
            rate_limiter,
        })
    }

    pub fn limits(&self) -> &BinanceLimits {
        &self.limits
    }

    fn binance_symbol(symbol: &str) -> String {
        symbol.replace('/', "").to_uppercase()
    }
}

#[derive(Debug, Deserialize)]
struct TickerPriceResponse {
    price: String,
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: Option<i64>,
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<RawCandle>> {
        self.rate_limiter.acquire(self.limits.kline_call_weight, "fetch_ohlcv").await;

        let limit = limit.unwrap_or(self.limits.klines_limit).min(self.limits.klines_limit);
        let mut url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            Self::binance_symbol(symbol),
            timeframe.as_str(),
            limit
        );
        if let Some(since) = since_ms {
            url.push_str(&format!("&startTime={since}"));
        }

        let resp = self.http.get(&url).send().await?.error_for_status()?;
        // Binance returns an array-of-arrays; each kline is
        // [openTime, open, high, low, close, volume, closeTime, ...].
        let raw: Vec<serde_json::Value> = resp.json().await?;

        let mut candles = Vec::with_capacity(raw.len());
        for row in raw {
            let arr = row
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("malformed kline row from Binance"))?;
            let parse_f64 = |idx: usize| -> anyhow::Result<f64> {
                arr.get(idx)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow::anyhow!("missing kline field {idx}"))?
                    .parse::<f64>()
                    .map_err(Into::into)
            };
            let open_time_ms = arr
                .first()
                .and_then(|v| v.as_i64())
                .ok_or_else(|| anyhow::anyhow!("missing kline open time"))?;

            candles.push(RawCandle {
                open_time_ms,
                open: parse_f64(1)?,
                high: parse_f64(2)?,
                low: parse_f64(3)?,
                close: parse_f64(4)?,
                volume: parse_f64(5)?,
            });
        }
        Ok(candles)
    }

    async fn fetch_ticker(&self, symbol: &str) -> anyhow::Result<f64> {
        self.rate_limiter.acquire(1, "fetch_ticker").await;

        let url = format!(
            "{}/api/v3/ticker/price?symbol={}",
            self.base_url,
            Self::binance_symbol(symbol)
        );
        let resp: TickerPriceResponse = self.http.get(&url).send().await?.error_for_status()?.json().await?;
        Ok(resp.price.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binance_symbol_strips_slash_and_upcases() {
        assert_eq!(BinanceClient::binance_symbol("btc/usdt"), "BTCUSDT");
    }
}
