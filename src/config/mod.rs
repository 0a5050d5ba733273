//! Configuration management for storywatch.
//!
//! Configuration is read from `~/.config/storywatch/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::parser::SelectorConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub selectors: SelectorConfig,
    pub fetch: FetchConfig,
    pub storage: StorageConfig,
}

/// Where the listing lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// First listing page; also used to resolve relative story links
    pub base_url: String,

    /// Path of listing page N relative to `base_url`; `{page}` is replaced
    pub page_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://v2.vost.pw/".to_string(),
            page_path: "page/{page}/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// User agent string sent with every request
    pub user_agent: String,

    /// Pause between listing pages during a multi-page sync (default: 500)
    pub page_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("storywatch/", env!("CARGO_PKG_VERSION")).to_string(),
            page_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding both store files; defaults to the platform data dir
    pub data_dir: Option<PathBuf>,

    pub cache_file: String,
    pub classification_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            cache_file: "cached_data.json".to_string(),
            classification_file: "data.json".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("storywatch")),
        }
    }

    pub fn cache_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join(&self.cache_file))
    }

    pub fn classification_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join(&self.classification_file))
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/storywatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("storywatch").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!("Created default config at {}", path.display());
        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# storywatch configuration

[source]
# First page of the story listing
base_url = "https://v2.vost.pw/"
# Path of listing page N, relative to base_url
page_path = "page/{page}/"

[selectors]
# CSS selectors for the forum markup
story = ".shortstory"
story_head = ".shortstoryHead"
story_link = "a[href]"
update_marker = ".staticInfoLeftData"
pager = ".block_4"
# Separates the story title from the site name in the page <title>
title_delimiter = "»"

[fetch]
# Request timeout in seconds
timeout_secs = 30
# Pause between listing pages during sync (milliseconds)
page_delay_ms = 500

[storage]
# Directory for the store files (default: platform data directory)
# data_dir = "/home/me/.local/share/storywatch"
cache_file = "cached_data.json"
classification_file = "data.json"
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
