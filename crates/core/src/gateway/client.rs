use crate::config::Settings;
use crate::domain::market::{IndexQuote, NewsItem, PriceUpdate, SentimentSnapshot, TradeLog};
use crate::domain::recommendation::Recommendation;
use crate::domain::trading::TradingConfig;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Contract with the external trading gateway. All order routing, OCA
/// brackets and ingestion live behind these endpoints; the dashboard only
/// reads state and forwards config/refresh requests.
#[async_trait::async_trait]
pub trait GatewayApi: Send + Sync {
    /// Available trading days, sorted descending.
    async fn dates(&self) -> Result<Vec<NaiveDate>>;

    async fn recommendations(&self, date: NaiveDate) -> Result<Vec<Recommendation>>;

    /// Live quote snapshot keyed by symbol.
    async fn prices(&self) -> Result<BTreeMap<String, PriceUpdate>>;

    async fn indices(&self) -> Result<Vec<IndexQuote>>;

    async fn trade_logs(&self, date: NaiveDate) -> Result<Vec<TradeLog>>;

    async fn ticker_news(&self, symbol: &str) -> Result<Vec<NewsItem>>;

    async fn social_sentiment(&self, symbol: &str) -> Result<SentimentSnapshot>;

    /// Triggers backend re-ingestion for a day. No response body contract
    /// beyond success/failure.
    async fn refresh_day(&self, date: NaiveDate) -> Result<()>;

    async fn trading_config(&self) -> Result<TradingConfig>;

    async fn put_trading_config(&self, config: &TradingConfig) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGateway {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_gateway_base_url()?.to_string();
        let api_key = settings.gateway_api_key.clone();

        let timeout_secs = std::env::var("GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build gateway http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    // No retry/backoff here: pollers simply pick up the next tick, and
    // interactive call sites degrade at the call site.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let res = self
            .http
            .get(self.url(path))
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .with_context(|| format!("gateway GET {path} failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read gateway response for {path}"))?;
        if !status.is_success() {
            anyhow::bail!("gateway GET {path} HTTP {status}: {text}");
        }

        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse gateway response for {path}"))
    }
}

#[async_trait::async_trait]
impl GatewayApi for HttpGateway {
    async fn dates(&self) -> Result<Vec<NaiveDate>> {
        self.get_json("/dates", &[]).await
    }

    async fn recommendations(&self, date: NaiveDate) -> Result<Vec<Recommendation>> {
        self.get_json("/recommendations", &[("date", date.to_string())])
            .await
    }

    async fn prices(&self) -> Result<BTreeMap<String, PriceUpdate>> {
        self.get_json("/prices", &[]).await
    }

    async fn indices(&self) -> Result<Vec<IndexQuote>> {
        self.get_json("/indices", &[]).await
    }

    async fn trade_logs(&self, date: NaiveDate) -> Result<Vec<TradeLog>> {
        self.get_json("/trade-logs", &[("date", date.to_string())])
            .await
    }

    async fn ticker_news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        self.get_json("/ticker-news", &[("symbol", symbol.to_string())])
            .await
    }

    async fn social_sentiment(&self, symbol: &str) -> Result<SentimentSnapshot> {
        self.get_json("/social-sentiment", &[("symbol", symbol.to_string())])
            .await
    }

    async fn refresh_day(&self, date: NaiveDate) -> Result<()> {
        let res = self
            .http
            .post(self.url("/admin/refresh-day"))
            .headers(self.headers()?)
            .query(&[
                ("date", date.format("%Y-%m-%d").to_string()),
                ("action", "refresh".to_string()),
            ])
            .send()
            .await
            .context("gateway refresh-day request failed")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("gateway refresh-day HTTP {status}: {text}");
        }
        Ok(())
    }

    async fn trading_config(&self) -> Result<TradingConfig> {
        self.get_json("/trading/config", &[]).await
    }

    async fn put_trading_config(&self, config: &TradingConfig) -> Result<()> {
        let res = self
            .http
            .put(self.url("/trading/config"))
            .headers(self.headers()?)
            .json(config)
            .send()
            .await
            .context("gateway trading config PUT failed")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("gateway trading config PUT HTTP {status}: {text}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_price_map_shape() {
        let v = json!({
            "ACME": {"price": 10.5, "change": 1.2, "volume": 3.0e6, "ref_price": 10.0},
            "BETA": {"price": 4.0}
        });

        let parsed: BTreeMap<String, PriceUpdate> = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("ACME").map(|p| p.price), Some(10.5));
        assert_eq!(parsed.get("BETA").and_then(|p| p.change), None);
    }

    #[test]
    fn parses_recommendation_with_missing_optionals() {
        let v = json!({
            "symbol": "ACME",
            "name": "Acme Corp",
            "price": 12.34
        });

        let parsed: Recommendation = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.symbol, "ACME");
        assert!(parsed.ref_price_1020.is_none());
        assert!(parsed.volume.is_none());
    }
}
