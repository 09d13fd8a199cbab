//! Configuration management for Scholar

pub mod progress;
pub mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::learning::Language;
use crate::theme::Theme;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Generation gateway endpoint (accepts `{action, payload}` POST requests)
    pub endpoint: String,

    /// Request timeout applied by the HTTP client
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Display language used when no session language is stored
    #[serde(default)]
    pub language: Language,

    /// Column width for lesson text
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    /// Ask the tutor for deeper, slower answers
    #[serde(default)]
    pub thinking_mode: bool,

    /// Replaces the built-in theme when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme: Option<Theme>,
}

fn default_timeout() -> u64 {
    120
}

fn default_wrap_width() -> usize {
    88
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8888/.netlify/functions/gemini".to_string(),
            request_timeout_secs: default_timeout(),
            language: Language::default(),
            wrap_width: default_wrap_width(),
            thinking_mode: false,
            custom_theme: None,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, writing defaults if it is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "scholar").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "scholar").context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Theme to draw with
    pub fn active_theme(&self) -> Theme {
        self.custom_theme.clone().unwrap_or_else(Theme::tokyo_night)
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
