use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::model::{Position, Viewport, DEFAULT_CENTER, DEFAULT_ZOOM};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DB_FILE_NAME: &str = "pinmap.db";

pub fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("org", "pinmap", "pinmap").context("Unable to locate home directory")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file, defaults to the platform data directory
    pub db_path: Option<PathBuf>,

    /// Base URL of a Nominatim compatible search service
    pub geocoder_url: String,

    pub user_agent: String,

    pub request_timeout_secs: u64,

    /// Quiet period before a suggestion query is sent
    pub debounce_ms: u64,

    pub suggestion_limit: usize,

    pub default_center: Position,

    pub default_zoom: u8,

    /// Port of the local API
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: None,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("pinmap/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 10,
            debounce_ms: 300,
            suggestion_limit: 5,
            default_center: DEFAULT_CENTER,
            default_zoom: DEFAULT_ZOOM,
            port: 8000,
        }
    }
}

impl Config {
    /// Loads `path`, or `config.json` from the platform config directory
    /// when no path is given. A missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => Config::read(path)?,
            None => {
                let default_path = get_project_dirs()?.config_dir().join(CONFIG_FILE_NAME);

                if default_path.exists() {
                    Config::read(&default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config {}", path.display()))?;

        serde_json::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Applies `PINMAP_DB` and `PINMAP_GEOCODER_URL` as read by `var`.
    /// Empty values are ignored.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| var(key).filter(|value| !value.trim().is_empty());

        if let Some(db_path) = var("PINMAP_DB") {
            self.db_path = Some(PathBuf::from(db_path));
        }

        if let Some(url) = var("PINMAP_GEOCODER_URL") {
            self.geocoder_url = url;
        }
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_project_dirs()?.data_dir().join(DB_FILE_NAME)),
        }
    }

    pub fn default_viewport(&self) -> Viewport {
        Viewport::new(self.default_center, self.default_zoom)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
