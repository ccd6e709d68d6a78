/// A single trading pair in the configured universe.
///
/// Identity is the `symbol` (e.g. `"BTC/USDT"`); `venue` names the exchange
/// the symbol is quoted on. The universe is a closed, configured set
/// (~28 symbols in production) — this type carries no discovery logic of
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Pair {
    pub symbol: String,
    pub venue: String,
    pub enabled: bool,
}

impl Pair {
    pub fn new(symbol: impl Into<String>, venue: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            venue: venue.into(),
            enabled: true,
        }
    }

    /// The base asset, e.g. `"BTC"` for `"BTC/USDT"`. Falls back to the
    /// full symbol if no separator is present.
    pub fn base_asset(&self) -> &str {
        self.symbol.split('/').next().unwrap_or(&self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_asset_splits_on_slash() {
        let p = Pair::new("BTC/USDT", "binance");
        assert_eq!(p.base_asset(), "BTC");
    }
}
