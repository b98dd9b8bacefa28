//! Configuration file support for Fitcoach.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitcoach/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub player: PlayerConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Credential presented to the backend
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub token: Option<String>,
}

/// Playback timing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Pause after a countdown hits zero so the final second can render
    #[serde(default = "default_completion_delay_ms")]
    pub completion_delay_ms: u64,

    #[serde(default = "default_autoplay_videos")]
    pub autoplay_videos: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            completion_delay_ms: default_completion_delay_ms(),
            autoplay_videos: default_autoplay_videos(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("fitcoach")
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_completion_delay_ms() -> u64 {
    100
}

fn default_autoplay_videos() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("fitcoach").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.player.tick_interval_ms == 0 {
            return Err(Error::Config(
                "player.tick_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
