use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use tapedesk_core::domain::market::{IndexQuote, PriceUpdate, TradeLog};
use tapedesk_core::domain::recommendation::Recommendation;
use tapedesk_core::gateway::GatewayApi;
use tapedesk_core::market;
use tapedesk_core::poll::Poller;
use tapedesk_core::settings::SettingsStore;
use tapedesk_core::table::{Selection, SortState};

const PRICE_POLL_PERIOD: Duration = Duration::from_secs(15);
const INDEX_POLL_PERIOD: Duration = Duration::from_secs(60);

/// In-memory view of the selected trading day. The recommendations are an
/// immutable snapshot; the prices map is a live overlay that is cleared
/// whenever a past date is selected.
#[derive(Debug, Default)]
pub struct MarketData {
    pub selected_date: Option<NaiveDate>,
    pub recommendations: Vec<Recommendation>,
    pub prices: BTreeMap<String, PriceUpdate>,
    pub indices: Vec<IndexQuote>,
    pub trade_logs: Vec<TradeLog>,
}

pub struct Pollers {
    pub prices: Poller,
    pub indices: Poller,
}

impl Default for Pollers {
    fn default() -> Self {
        Self {
            prices: Poller::new("prices", PRICE_POLL_PERIOD),
            indices: Poller::new("indices", INDEX_POLL_PERIOD),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn GatewayApi>,
    pub settings: SettingsStore,
    pub chart_base_url: String,
    pub market: Arc<RwLock<MarketData>>,
    pub selection: Arc<RwLock<Selection>>,
    pub sort: Arc<RwLock<SortState>>,
    pub pollers: Arc<Mutex<Pollers>>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn GatewayApi>, settings: SettingsStore, chart_base_url: String) -> Self {
        Self {
            gateway,
            settings,
            chart_base_url,
            market: Arc::new(RwLock::new(MarketData::default())),
            selection: Arc::new(RwLock::new(Selection::default())),
            sort: Arc::new(RwLock::new(SortState::default())),
            pollers: Arc::new(Mutex::new(Pollers::default())),
        }
    }

    pub async fn selected_date(&self) -> Option<NaiveDate> {
        self.market.read().await.selected_date
    }

    pub async fn selected_is_today(&self) -> bool {
        match self.selected_date().await {
            Some(d) => market::is_today(d, chrono::Utc::now()),
            None => false,
        }
    }

    /// Switches the dashboard to a trading day. Fetch failures keep the
    /// previous day's data on screen; the overlay and pollers are still
    /// adjusted so a past date never shows live values.
    pub async fn select_date(&self, date: NaiveDate) {
        match self.gateway.recommendations(date).await {
            Ok(rows) => {
                let mut market = self.market.write().await;
                market.selected_date = Some(date);
                market.recommendations = rows;
            }
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(%date, error = %err, "recommendations fetch failed; keeping previous day");
                self.market.write().await.selected_date = Some(date);
            }
        }

        match self.gateway.trade_logs(date).await {
            Ok(logs) => self.market.write().await.trade_logs = logs,
            Err(err) => {
                tracing::warn!(%date, error = %err, "trade logs fetch failed; keeping previous list");
            }
        }

        self.selection.write().await.clear();

        let today = market::is_today(date, chrono::Utc::now());
        if !today {
            self.market.write().await.prices.clear();
        }
        self.apply_poller_policy(today).await;
    }

    /// Pollers run only for the today context; past dates stop them.
    async fn apply_poller_policy(&self, today: bool) {
        let mut pollers = self.pollers.lock().await;
        if today {
            if !pollers.prices.is_running() {
                let state = self.clone();
                pollers.prices.start(move || {
                    let state = state.clone();
                    async move { state.refresh_prices().await }
                });
            }
            if !pollers.indices.is_running() {
                let state = self.clone();
                pollers.indices.start(move || {
                    let state = state.clone();
                    async move { state.refresh_indices().await }
                });
            }
        } else {
            pollers.prices.stop();
            pollers.indices.stop();
        }
    }

    /// Page-visibility signal from the client; hidden pauses both pollers.
    pub async fn set_visible(&self, visible: bool) {
        let mut pollers = self.pollers.lock().await;
        pollers.prices.set_visible(visible);
        pollers.indices.set_visible(visible);
    }

    pub async fn refresh_prices(&self) -> anyhow::Result<()> {
        if !self.selected_is_today().await {
            return Ok(());
        }
        let prices = self.gateway.prices().await?;
        self.market.write().await.prices = prices;
        Ok(())
    }

    pub async fn refresh_indices(&self) -> anyhow::Result<()> {
        let indices = self.gateway.indices().await?;
        self.market.write().await.indices = indices;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tapedesk_core::domain::market::{NewsItem, SentimentSnapshot};
    use tapedesk_core::domain::trading::TradingConfig;

    #[derive(Default)]
    struct StubGateway {
        rows: Vec<Recommendation>,
        prices: BTreeMap<String, PriceUpdate>,
        fail_recommendations: AtomicBool,
    }

    fn rec(symbol: &str, price: f64) -> Recommendation {
        Recommendation {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            sector: None,
            price,
            change_percent: None,
            ref_price_1020: None,
            ref_price_1120: None,
            ref_price_1220: None,
            high: None,
            low_before_peak: None,
            volume: None,
            open: None,
            probability: None,
            position_qty: None,
            position_pnl: None,
            tag_color: None,
        }
    }

    #[async_trait::async_trait]
    impl GatewayApi for StubGateway {
        async fn dates(&self) -> Result<Vec<NaiveDate>> {
            Ok(Vec::new())
        }

        async fn recommendations(&self, _date: NaiveDate) -> Result<Vec<Recommendation>> {
            if self.fail_recommendations.load(Ordering::SeqCst) {
                anyhow::bail!("gateway down")
            }
            Ok(self.rows.clone())
        }

        async fn prices(&self) -> Result<BTreeMap<String, PriceUpdate>> {
            Ok(self.prices.clone())
        }

        async fn indices(&self) -> Result<Vec<IndexQuote>> {
            Ok(Vec::new())
        }

        async fn trade_logs(&self, _date: NaiveDate) -> Result<Vec<TradeLog>> {
            Ok(Vec::new())
        }

        async fn ticker_news(&self, _symbol: &str) -> Result<Vec<NewsItem>> {
            Ok(Vec::new())
        }

        async fn social_sentiment(&self, _symbol: &str) -> Result<SentimentSnapshot> {
            Ok(SentimentSnapshot::default())
        }

        async fn refresh_day(&self, _date: NaiveDate) -> Result<()> {
            Ok(())
        }

        async fn trading_config(&self) -> Result<TradingConfig> {
            anyhow::bail!("not configured")
        }

        async fn put_trading_config(&self, _config: &TradingConfig) -> Result<()> {
            Ok(())
        }
    }

    fn app_state(gateway: Arc<StubGateway>) -> AppState {
        let path = std::env::temp_dir().join(format!(
            "tapedesk-state-test-{}.json",
            std::process::id()
        ));
        AppState::new(
            gateway,
            SettingsStore::open(path),
            "https://charts.example/view".to_string(),
        )
    }

    #[tokio::test]
    async fn selecting_today_starts_pollers_and_past_stops_them() {
        let today = market::session_date(chrono::Utc::now());
        let gateway = Arc::new(StubGateway {
            rows: vec![rec("ACME", 10.0)],
            ..Default::default()
        });
        let state = app_state(gateway);

        state.select_date(today).await;
        assert!(state.selected_is_today().await);
        assert!(state.pollers.lock().await.prices.is_running());

        let past = today - chrono::Duration::days(7);
        state.select_date(past).await;
        assert!(!state.selected_is_today().await);
        assert!(!state.pollers.lock().await.prices.is_running());
    }

    #[tokio::test]
    async fn past_date_clears_the_price_overlay() {
        let today = market::session_date(chrono::Utc::now());
        let mut prices = BTreeMap::new();
        prices.insert(
            "ACME".to_string(),
            PriceUpdate {
                price: 11.0,
                change: None,
                volume: None,
                open: None,
                high: None,
                sector: None,
                ref_price: None,
            },
        );
        let gateway = Arc::new(StubGateway {
            rows: vec![rec("ACME", 10.0)],
            prices,
            ..Default::default()
        });
        let state = app_state(gateway);

        state.select_date(today).await;
        state.refresh_prices().await.unwrap();
        assert_eq!(state.market.read().await.prices.len(), 1);

        state.select_date(today - chrono::Duration::days(1)).await;
        assert!(state.market.read().await.prices.is_empty());

        // And refreshes on a past date stay a no-op.
        state.refresh_prices().await.unwrap();
        assert!(state.market.read().await.prices.is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_rows() {
        let today = market::session_date(chrono::Utc::now());
        let gateway = Arc::new(StubGateway {
            rows: vec![rec("ACME", 10.0)],
            ..Default::default()
        });
        let state = app_state(gateway.clone());

        state.select_date(today).await;
        assert_eq!(state.market.read().await.recommendations.len(), 1);

        gateway.fail_recommendations.store(true, Ordering::SeqCst);

        state.select_date(today - chrono::Duration::days(1)).await;
        let market = state.market.read().await;
        assert_eq!(market.recommendations.len(), 1);
        assert_eq!(
            market.selected_date,
            Some(today - chrono::Duration::days(1))
        );
    }
}
