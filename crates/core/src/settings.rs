use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

fn default_mvso_threshold() -> f64 {
    3.0
}

fn default_stop_loss_threshold() -> f64 {
    5.0
}

fn default_theme() -> String {
    "dark".to_string()
}

/// User preferences, the server-side analog of the old per-browser storage.
/// Unknown fields in an existing file are dropped on the next save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default = "default_mvso_threshold")]
    pub mvso_threshold: f64,
    #[serde(default = "default_stop_loss_threshold")]
    pub stop_loss_threshold: f64,
    #[serde(default)]
    pub show_extra_hours: bool,
    #[serde(default)]
    pub min_volume: f64,
    #[serde(default)]
    pub min_open_price: f64,
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Free-text notes keyed by ticker symbol.
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            mvso_threshold: default_mvso_threshold(),
            stop_loss_threshold: default_stop_loss_threshold(),
            show_extra_hours: false,
            min_volume: 0.0,
            min_open_price: 0.0,
            theme: default_theme(),
            notes: BTreeMap::new(),
        }
    }
}

/// Get/set/subscribe settings service backed by a JSON file. Reads never
/// fail: a missing or unreadable file yields defaults. Writes persist to
/// disk first and then notify subscribers.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: Arc<PathBuf>,
    tx: Arc<watch::Sender<DashboardSettings>>,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "settings file unreadable; using defaults");
                    DashboardSettings::default()
                }
            },
            Err(_) => DashboardSettings::default(),
        };

        let (tx, _) = watch::channel(initial);
        Self {
            path: Arc::new(path),
            tx: Arc::new(tx),
        }
    }

    pub fn get(&self) -> DashboardSettings {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSettings> {
        self.tx.subscribe()
    }

    pub fn update(
        &self,
        mutate: impl FnOnce(&mut DashboardSettings),
    ) -> anyhow::Result<DashboardSettings> {
        let mut next = self.get();
        mutate(&mut next);
        self.replace(next)
    }

    pub fn replace(&self, next: DashboardSettings) -> anyhow::Result<DashboardSettings> {
        let raw = serde_json::to_string_pretty(&next).context("serialize settings failed")?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create settings dir {} failed", parent.display()))?;
            }
        }
        std::fs::write(self.path.as_ref(), raw)
            .with_context(|| format!("write settings file {} failed", self.path.display()))?;

        self.tx.send_replace(next.clone());
        Ok(next)
    }
}
