use serde::{Deserialize, Serialize};

/// Auto-trading configuration held by the external execution gateway. A
/// single record, fetched and replaced wholesale via PUT; signal generation,
/// order placement and OCA brackets all live behind the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    pub take_profit_percent: f64,
    pub stop_loss_percent: f64,
    pub max_stocks: u32,
    pub min_volume: f64,
    pub min_price: f64,
    /// Execution time of day, "HH:MM" in exchange-local time.
    pub execution_time: String,
    pub retry_count: u32,
    pub retry_delay_secs: u64,
    pub enabled: bool,
}
