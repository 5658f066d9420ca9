use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use tapedesk_core::calc::{plan_position, PositionInputs, PositionPlan};
use tapedesk_core::table::RowFilter;

mod config;
mod panels;
mod table;
mod view;

/// Outcome payload for save-style endpoints: the UI shows `message` as an
/// inline banner instead of surfacing an HTTP error.
#[derive(Debug, Serialize)]
pub struct SaveOutcome {
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveOutcome {
    pub fn ok() -> Self {
        Self {
            saved: true,
            message: None,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            saved: false,
            message: Some(message),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/dates", get(get_dates))
        .route("/api/view", get(view::get_view).put(view::put_view))
        .route("/api/table", get(table::get_table))
        .route("/api/table/sort", post(table::post_sort))
        .route("/api/selection", post(table::post_selection))
        .route("/api/charts/launch", get(table::get_chart_launch))
        .route("/api/indices", get(get_indices))
        .route("/api/news", get(panels::get_news))
        .route("/api/sentiment", get(panels::get_sentiment))
        .route(
            "/api/calculator",
            get(get_calculator).post(post_calculator),
        )
        .route(
            "/api/settings",
            get(get_settings).put(put_settings),
        )
        .route(
            "/api/trading/config",
            get(config::get_trading_config).put(config::put_trading_config),
        )
        .route("/api/admin/refresh-day", post(post_refresh_day))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_dates(State(state): State<AppState>) -> Json<Vec<chrono::NaiveDate>> {
    match state.gateway.dates().await {
        Ok(dates) => Json(dates),
        Err(err) => {
            tracing::warn!(error = %err, "dates fetch failed; returning empty list");
            Json(Vec::new())
        }
    }
}

async fn get_indices(State(state): State<AppState>) -> Json<Vec<tapedesk_core::domain::market::IndexQuote>> {
    Json(state.market.read().await.indices.clone())
}

async fn post_calculator(Json(inputs): Json<PositionInputs>) -> Json<PositionPlan> {
    Json(plan_position(inputs))
}

#[derive(Debug, Deserialize)]
struct CalculatorQuery {
    symbol: Option<String>,
}

/// Prefilled calculator inputs. The entry price re-seeds from the ticker's
/// current (live-over-static) price every time it is requested.
async fn get_calculator(
    State(state): State<AppState>,
    Query(q): Query<CalculatorQuery>,
) -> Json<PositionInputs> {
    let today = state.selected_is_today().await;
    let market = state.market.read().await;

    let entry_price = q
        .symbol
        .as_deref()
        .and_then(|symbol| {
            market
                .recommendations
                .iter()
                .find(|r| r.symbol == symbol)
                .map(|row| {
                    tapedesk_core::metrics::live_price(row, market.prices.get(symbol), today)
                })
        })
        .unwrap_or(0.0);

    Json(PositionInputs {
        entry_price,
        stop_loss_percent: 5.0,
        take_profit_percent: 10.0,
        shares: 100.0,
    })
}

async fn get_settings(
    State(state): State<AppState>,
) -> Json<tapedesk_core::settings::DashboardSettings> {
    Json(state.settings.get())
}

async fn put_settings(
    State(state): State<AppState>,
    Json(next): Json<tapedesk_core::settings::DashboardSettings>,
) -> Json<SaveOutcome> {
    match state.settings.replace(next) {
        Ok(_) => Json(SaveOutcome::ok()),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "settings save failed");
            Json(SaveOutcome::failed(format!("{err:#}")))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshDayQuery {
    date: chrono::NaiveDate,
}

/// Proxies the backend re-ingestion trigger, then re-selects the day so the
/// table reflects the refreshed snapshot.
async fn post_refresh_day(
    State(state): State<AppState>,
    Query(q): Query<RefreshDayQuery>,
) -> Json<SaveOutcome> {
    match state.gateway.refresh_day(q.date).await {
        Ok(()) => {
            state.select_date(q.date).await;
            Json(SaveOutcome::ok())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(date = %q.date, error = %err, "refresh-day failed");
            Json(SaveOutcome::failed(format!("{err:#}")))
        }
    }
}

/// The filter applied to the table: explicit query values win, otherwise the
/// persisted preferences are used.
pub(crate) fn effective_filter(
    settings: &tapedesk_core::settings::DashboardSettings,
    min_volume: Option<f64>,
    min_open_price: Option<f64>,
) -> RowFilter {
    RowFilter {
        min_volume_millions: min_volume.unwrap_or(settings.min_volume),
        min_open_price: min_open_price.unwrap_or(settings.min_open_price),
    }
}
