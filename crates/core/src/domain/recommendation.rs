use serde::{Deserialize, Serialize};

/// One row of the daily recommendation table. Immutable snapshot for a given
/// trading day; refreshed wholesale by re-fetching the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub change_percent: Option<f64>,
    /// Reference price captured by the backend at 10:20 exchange time.
    #[serde(default)]
    pub ref_price_1020: Option<f64>,
    #[serde(default)]
    pub ref_price_1120: Option<f64>,
    #[serde(default)]
    pub ref_price_1220: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low_before_peak: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub position_qty: Option<f64>,
    #[serde(default)]
    pub position_pnl: Option<f64>,
    #[serde(default)]
    pub tag_color: Option<String>,
}
