use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://kanban-app-pcee.onrender.com";
const API_URL_ENV: &str = "TASKBOARD_API_URL";
const LOCAL_CONFIG: &str = "taskboard.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Service root; `/tasks` is appended.
    #[serde(default = "default_api_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// EnvFilter directive. `RUST_LOG` wins when set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Log to stderr. Ignored while the board UI owns the terminal.
    #[serde(default)]
    pub console: bool,

    #[serde(default = "default_true")]
    pub file: bool,

    /// Log directory; falls back to the platform data dir.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            console: false,
            file: true,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_notice_ttl")]
    pub notice_ttl_secs: u64,

    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_ttl_secs: default_notice_ttl(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_notice_ttl() -> u64 {
    5
}

fn default_tick_ms() -> u64 {
    250
}

/// `~/.config/taskboard` (or the platform equivalent).
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("taskboard"))
}

/// `~/.local/share/taskboard` (or the platform equivalent).
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("taskboard")
}

pub fn load_from(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {} failed: {}", path.display(), e))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("parse {} failed: {}", path.display(), e))?;
    Ok(cfg)
}

/// Resolve configuration: explicit path, then the user config dir, then
/// `./taskboard.toml`, then defaults. `TASKBOARD_API_URL` overrides the file.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut cfg = match explicit {
        Some(path) => load_from(path)?,
        None => {
            let user = config_dir().map(|d| d.join("config.toml"));
            let local = Path::new(LOCAL_CONFIG);
            match user.filter(|p| p.exists()) {
                Some(path) => load_from(&path)?,
                None if local.exists() => load_from(local)?,
                None => AppConfig::default(),
            }
        }
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            cfg.api.base_url = url;
        }
    }

    if cfg.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }

    Ok(cfg)
}
