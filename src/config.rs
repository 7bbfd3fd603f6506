use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::resolver::{DEFAULT_EPISODE_URL, DEFAULT_MOVIE_URL};
use crate::tmdb::{DEFAULT_BASE_URL, DEFAULT_LANGUAGE, DEFAULT_TIMEOUT};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory not found")]
    NoConfigDir,
    #[error("failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub addon: AddonConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_language")]
    pub language: String,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            language: default_language(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// URL templates for the link resolver. `{id}`, `{season}` and `{episode}` are substituted.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_movie_url")]
    pub movie_url: String,
    #[serde(default = "default_episode_url")]
    pub episode_url: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            movie_url: default_movie_url(),
            episode_url: default_episode_url(),
        }
    }
}

fn default_movie_url() -> String {
    DEFAULT_MOVIE_URL.to_string()
}

fn default_episode_url() -> String {
    DEFAULT_EPISODE_URL.to_string()
}

#[derive(Default, Debug, Clone, Deserialize)]
pub struct AddonConfig {
    pub icons_dir: Option<PathBuf>,
}

impl AddonConfig {
    pub fn icons_dir(&self) -> PathBuf {
        self.icons_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("resources").join("images").join("icons"))
    }
}

impl Config {
    /// Load from the platform config dir. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "vska")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.catalog.base_url.trim_end_matches('/');
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError(
                "catalog.base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "catalog.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if !self.resolver.movie_url.contains("{id}") {
            return Err(ConfigError::ValidationError(
                "resolver.movie_url must contain {id}".to_string(),
            ));
        }

        for placeholder in ["{id}", "{season}", "{episode}"] {
            if !self.resolver.episode_url.contains(placeholder) {
                return Err(ConfigError::ValidationError(format!(
                    "resolver.episode_url must contain {}",
                    placeholder
                )));
            }
        }

        Ok(())
    }
}
