use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::state::AppState;
use tapedesk_core::domain::market::{NewsItem, SentimentSnapshot};

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    symbol: String,
}

/// Per-ticker news panel. Failures degrade to an empty panel; the dashboard
/// keeps rendering.
pub async fn get_news(
    State(state): State<AppState>,
    Query(q): Query<SymbolQuery>,
) -> Json<Vec<NewsItem>> {
    match state.gateway.ticker_news(&q.symbol).await {
        Ok(items) => Json(items),
        Err(err) => {
            tracing::warn!(symbol = %q.symbol, error = %err, "news fetch failed; returning empty panel");
            Json(Vec::new())
        }
    }
}

pub async fn get_sentiment(
    State(state): State<AppState>,
    Query(q): Query<SymbolQuery>,
) -> Json<SentimentSnapshot> {
    match state.gateway.social_sentiment(&q.symbol).await {
        Ok(snapshot) => Json(snapshot),
        Err(err) => {
            tracing::warn!(symbol = %q.symbol, error = %err, "sentiment fetch failed; returning empty panel");
            Json(SentimentSnapshot::default())
        }
    }
}
