use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Environment variable prefix; nested keys use `__`, e.g.
/// `NOVEL_DESK_API__BASE_URL`.
pub const ENV_PREFIX: &str = "NOVEL_DESK_";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub tui: TuiConfig,
    pub generation: GenerationConfig,
    pub data: DataConfig,
}

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the writing backend.
    pub base_url: String,
    /// Per-request timeout. Generation calls can take minutes.
    pub timeout_secs: u64,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
}

/// Request parameters the views send on the user's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub outline_theme: String,
    pub outline_total_words: u32,
    pub character_constraints: String,
    pub chapter_target_words: u32,
    pub chapter_instruction: String,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory (logs live under it).
    pub data_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 600,
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 50 }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            outline_theme: String::new(),
            outline_total_words: 80_000,
            character_constraints: String::new(),
            chapter_target_words: 2500,
            chapter_instruction: "Heighten the conflict and suspense; plant a twist at the end."
                .to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then `~/.config/novel-desk/config.toml`,
    /// then `NOVEL_DESK_*` environment variables.
    ///
    /// Runs before logging is up, so the caller reports a failure once the
    /// subscriber is installed.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(&Self::config_path())
    }

    /// Defaults merged with a TOML file. A missing file contributes nothing.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path))
    }

    /// Load from an explicit file, with environment overrides on top.
    pub fn load_from(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(path)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("novel-desk").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("novel-desk"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

}
