use crate::domain::Pair;

/// The closed, configured set of trading pairs (~28 symbols in production,
/// spec §3). A handful of majors are seeded as a sane default; deployments
/// override this with their own list.
pub fn default_universe() -> Vec<Pair> {
    const SYMBOLS: &[&str] = &[
        "BTC/USDT",
        "ETH/USDT",
        "BNB/USDT",
        "SOL/USDT",
        "XRP/USDT",
        "ADA/USDT",
        "AVAX/USDT",
        "DOGE/USDT",
        "DOT/USDT",
        "LINK/USDT",
    ];
    SYMBOLS.iter().map(|s| Pair::new(*s, "binance")).collect()
}

/// Symbol used as the market-wide trend reference in Screen 1 (§4.3).
pub const MARKET_REFERENCE_SYMBOL: &str = "BTC/USDT";
