use axum::{extract::State, http::StatusCode, Json};

use crate::routes::SaveOutcome;
use crate::state::AppState;
use tapedesk_core::domain::trading::TradingConfig;

/// The auto-trading form reads the single config record straight from the
/// gateway; there is no local copy to fall back to.
pub async fn get_trading_config(
    State(state): State<AppState>,
) -> Result<Json<TradingConfig>, StatusCode> {
    state
        .gateway
        .trading_config()
        .await
        .map(Json)
        .map_err(|err| {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "trading config fetch failed");
            StatusCode::BAD_GATEWAY
        })
}

/// Wholesale replacement via the gateway. A failed save is reported as an
/// inline banner payload, never as a 5xx.
pub async fn put_trading_config(
    State(state): State<AppState>,
    Json(config): Json<TradingConfig>,
) -> Json<SaveOutcome> {
    match state.gateway.put_trading_config(&config).await {
        Ok(()) => Json(SaveOutcome::ok()),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "trading config save failed");
            Json(SaveOutcome::failed(format!("{err:#}")))
        }
    }
}
