pub mod calc;
pub mod domain;
pub mod gateway;
pub mod market;
pub mod metrics;
pub mod poll;
pub mod settings;
pub mod table;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gateway_base_url: Option<String>,
        pub gateway_api_key: Option<String>,
        pub chart_base_url: Option<String>,
        pub settings_path: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                gateway_base_url: std::env::var("GATEWAY_BASE_URL").ok(),
                gateway_api_key: std::env::var("GATEWAY_API_KEY").ok(),
                chart_base_url: std::env::var("CHART_BASE_URL").ok(),
                settings_path: std::env::var("DASHBOARD_SETTINGS_PATH").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_gateway_base_url(&self) -> anyhow::Result<&str> {
            self.gateway_base_url
                .as_deref()
                .context("GATEWAY_BASE_URL is required")
        }
    }
}
