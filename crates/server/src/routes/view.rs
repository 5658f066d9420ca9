use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub selected_date: Option<chrono::NaiveDate>,
    pub today: bool,
    pub polling: bool,
}

pub async fn get_view(State(state): State<AppState>) -> Json<ViewResponse> {
    let selected_date = state.selected_date().await;
    let today = state.selected_is_today().await;
    let polling = state.pollers.lock().await.prices.is_running();
    Json(ViewResponse {
        selected_date,
        today,
        polling,
    })
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub date: Option<chrono::NaiveDate>,
    /// Page-visibility signal; hidden pauses the pollers without tearing
    /// them down.
    pub visible: Option<bool>,
}

pub async fn put_view(
    State(state): State<AppState>,
    Json(req): Json<ViewRequest>,
) -> Json<ViewResponse> {
    if let Some(date) = req.date {
        state.select_date(date).await;
    }
    if let Some(visible) = req.visible {
        state.set_visible(visible).await;
    }
    get_view(State(state)).await
}
