use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_CONFIG_PATH: &str = "config/therapy-chat";
const ENV_PREFIX: &str = "THERAPY_CHAT";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub voice: VoiceConfig,
    pub storage: StorageConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Sample rate requested from the microphone
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Local key-value store file, `~` is expanded
    pub path: String,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).as_ref())
    }
}

impl Config {
    /// Load defaults, then the optional config file at `path`, then
    /// `THERAPY_CHAT_*` environment overrides (`__` separates sections).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("api.timeout_secs", 60_i64)?
            .set_default("voice.sample_rate", 16000_i64)?
            .set_default("voice.channels", 1_i64)?
            .set_default("storage.path", "~/.therapy-chat/state.json")?
            .set_default("log_level", "warn")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
