use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::routes::effective_filter;
use crate::state::AppState;
use tapedesk_core::domain::market::TradeLog;
use tapedesk_core::metrics;
use tapedesk_core::table::{self, SortColumn, SortDirection, SortState};

#[derive(Debug, Deserialize)]
pub struct TableQuery {
    sort: Option<SortColumn>,
    dir: Option<SortDirection>,
    min_volume: Option<f64>,
    min_open_price: Option<f64>,
}

/// One rendered table row: static fields resolved against the live overlay,
/// derived metrics recomputed, plus the user's note and trade-log tooltip.
#[derive(Debug, Serialize)]
pub struct TableRow {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub price: f64,
    pub change_pct: f64,
    pub ref_price: Option<f64>,
    pub ref_price_1120: Option<f64>,
    pub ref_price_1220: Option<f64>,
    pub volume: Option<f64>,
    pub open: Option<f64>,
    pub mvso_pct: f64,
    pub mvso_hit: bool,
    pub drawdown_pct: Option<f64>,
    pub drawdown_exceeds_stop: bool,
    pub probability: Option<f64>,
    pub position_qty: Option<f64>,
    pub position_pnl: Option<f64>,
    pub tag_color: Option<String>,
    pub note: Option<String>,
    pub selected: bool,
    pub trade_log: Option<TradeLog>,
}

#[derive(Debug, Serialize)]
pub struct TableResponse {
    pub as_of_date: Option<chrono::NaiveDate>,
    pub today: bool,
    pub sort: SortState,
    pub all_selected: bool,
    pub rows: Vec<TableRow>,
}

pub async fn get_table(
    State(state): State<AppState>,
    Query(q): Query<TableQuery>,
) -> Json<TableResponse> {
    let settings = state.settings.get();
    let filter = effective_filter(&settings, q.min_volume, q.min_open_price);

    let sort = match (q.sort, q.dir) {
        (Some(column), Some(direction)) => SortState { column, direction },
        (Some(column), None) => SortState {
            column,
            direction: SortDirection::Descending,
        },
        _ => *state.sort.read().await,
    };

    let today = state.selected_is_today().await;
    let market = state.market.read().await;

    let visible = table::visible_rows(
        &market.recommendations,
        &market.prices,
        today,
        filter,
        sort,
    );

    let selection = state.selection.read().await;
    let all_selected = selection.all_selected(visible.len());

    let rows = visible
        .into_iter()
        .map(|row| {
            let update = market.prices.get(&row.symbol);
            let derived = metrics::compute(&row, update, today, settings.stop_loss_threshold);
            let trade_log = market
                .trade_logs
                .iter()
                .find(|log| log.symbol == row.symbol)
                .cloned();
            let (ref_1120, ref_1220) = if settings.show_extra_hours {
                (row.ref_price_1120, row.ref_price_1220)
            } else {
                (None, None)
            };
            TableRow {
                selected: selection.contains(&row.symbol),
                note: settings.notes.get(&row.symbol).cloned(),
                sector: metrics::effective_sector(&row, update, today).map(str::to_string),
                price: derived.live_price,
                change_pct: derived.change_pct,
                ref_price: metrics::reference_price(&row, update, today),
                ref_price_1120: ref_1120,
                ref_price_1220: ref_1220,
                volume: metrics::effective_volume(&row, update, today),
                open: metrics::effective_open(&row, update, today),
                mvso_pct: derived.mvso_pct,
                mvso_hit: derived.mvso_pct >= settings.mvso_threshold,
                drawdown_pct: derived.drawdown_pct,
                drawdown_exceeds_stop: derived.drawdown_exceeds_stop,
                probability: row.probability,
                position_qty: row.position_qty,
                position_pnl: row.position_pnl,
                tag_color: row.tag_color,
                trade_log,
                symbol: row.symbol,
                name: row.name,
            }
        })
        .collect();

    Json(TableResponse {
        as_of_date: market.selected_date,
        today,
        sort,
        all_selected,
        rows,
    })
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub column: SortColumn,
}

/// Header-click semantics: same column flips direction, a new column starts
/// descending. The toggled state becomes the default for later table reads.
pub async fn post_sort(
    State(state): State<AppState>,
    Json(req): Json<SortRequest>,
) -> Json<SortState> {
    let mut sort = state.sort.write().await;
    sort.toggle(req.column);
    Json(*sort)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum SelectionRequest {
    Toggle { symbol: String },
    SelectAll,
    Clear,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selected: Vec<String>,
    pub all_selected: bool,
}

pub async fn post_selection(
    State(state): State<AppState>,
    Json(req): Json<SelectionRequest>,
) -> Json<SelectionResponse> {
    let settings = state.settings.get();
    let filter = effective_filter(&settings, None, None);
    let sort = *state.sort.read().await;

    let today = state.selected_is_today().await;
    let market = state.market.read().await;
    let visible = table::visible_rows(
        &market.recommendations,
        &market.prices,
        today,
        filter,
        sort,
    );

    let mut selection = state.selection.write().await;
    match req {
        SelectionRequest::Toggle { symbol } => selection.toggle(&symbol),
        SelectionRequest::SelectAll => selection.select_all(visible.iter()),
        SelectionRequest::Clear => selection.clear(),
    }

    Json(SelectionResponse {
        selected: selection.symbols().map(str::to_string).collect(),
        all_selected: selection.all_selected(visible.len()),
    })
}

#[derive(Debug, Deserialize)]
pub struct ChartLaunchQuery {
    /// Comma-separated override; defaults to the current selection.
    symbols: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChartLaunchResponse {
    pub url: String,
}

pub async fn get_chart_launch(
    State(state): State<AppState>,
    Query(q): Query<ChartLaunchQuery>,
) -> Json<ChartLaunchResponse> {
    let base = state.chart_base_url.trim_end_matches('/');
    let url = match q.symbols {
        Some(symbols) => format!("{base}?symbols={symbols}"),
        None => state.selection.read().await.chart_launch_url(base),
    };
    Json(ChartLaunchResponse { url })
}
