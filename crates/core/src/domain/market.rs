use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live quote for one symbol. Overlays (never replaces) the static
/// Recommendation row, and only for the current trading day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub price: f64,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub ref_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexQuote {
    pub symbol: String,
    pub price: f64,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

/// Historical execution record, matched to a table row by symbol for the
/// entry/TP/SL tooltip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLog {
    pub symbol: String,
    pub entry_price: f64,
    #[serde(default)]
    pub take_profit_price: Option<f64>,
    #[serde(default)]
    pub stop_loss_price: Option<f64>,
    pub quantity: f64,
    pub status: String,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub mentions: Option<u64>,
    #[serde(default)]
    pub positive: Option<u64>,
    #[serde(default)]
    pub negative: Option<u64>,
}
