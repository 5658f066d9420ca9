use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tapedesk_core::gateway::HttpGateway;
use tapedesk_core::market;
use tapedesk_core::settings::SettingsStore;

mod routes;
mod state;

use state::AppState;

const DEFAULT_SETTINGS_PATH: &str = "tapedesk-settings.json";
const DEFAULT_CHART_BASE_URL: &str = "https://www.tradingview.com/chart/";

#[derive(Debug, Parser)]
#[command(name = "tapedesk_server")]
struct Args {
    /// Trading day to open with (YYYY-MM-DD). Defaults to the most recent
    /// day the gateway knows about.
    #[arg(long)]
    date: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tapedesk_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let gateway = HttpGateway::from_settings(&settings)?;

    let store = SettingsStore::open(
        settings
            .settings_path
            .clone()
            .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string()),
    );
    let chart_base_url = settings
        .chart_base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_CHART_BASE_URL.to_string());

    let app_state = AppState::new(Arc::new(gateway), store, chart_base_url);

    let initial_date = resolve_initial_date(&app_state, args.date.as_deref()).await?;
    app_state.select_date(initial_date).await;

    if let Err(err) = app_state.refresh_indices().await {
        tracing::warn!(error = %err, "initial index fetch failed; panel starts empty");
    }

    let app = routes::build_router(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Explicit --date wins; otherwise the newest gateway date; otherwise the
/// current exchange session date so the dashboard still opens when the
/// gateway is unreachable.
async fn resolve_initial_date(
    state: &AppState,
    date_arg: Option<&str>,
) -> anyhow::Result<chrono::NaiveDate> {
    if let Some(s) = date_arg {
        return chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --date {s}"));
    }

    match state.gateway.dates().await {
        Ok(dates) => Ok(dates
            .first()
            .copied()
            .unwrap_or_else(|| market::session_date(chrono::Utc::now()))),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "dates fetch failed; starting on the current session date");
            Ok(market::session_date(chrono::Utc::now()))
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &tapedesk_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
