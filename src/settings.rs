use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("data directory not found")]
    NoDataDir,
    #[error("failed to write settings: {0}")]
    WriteError(#[from] std::io::Error),
    #[error("failed to serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Catalog API key
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Keep the key out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Where the credential lives between invocations
pub trait CredentialStore {
    fn credential(&self) -> Option<Credential>;

    fn set_credential(&mut self, credential: Credential) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Settings {
    apikey: Option<String>,
}

/// Settings persisted as TOML on disk
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn open() -> Result<Self, SettingsError> {
        Ok(Self::at(Self::settings_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn settings_path() -> Result<PathBuf, SettingsError> {
        ProjectDirs::from("", "", "vska")
            .map(|dirs| dirs.data_dir().join("settings.toml"))
            .ok_or(SettingsError::NoDataDir)
    }

    fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(settings) => {
                    debug!("loaded settings");
                    settings
                }
                Err(e) => {
                    error!("failed to parse settings: {}", e);
                    Settings::default()
                }
            },
            Err(e) => {
                error!("failed to read settings: {}", e);
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl CredentialStore for SettingsFile {
    fn credential(&self) -> Option<Credential> {
        self.load()
            .apikey
            .map(Credential::new)
            .filter(|c| !c.is_empty())
    }

    fn set_credential(&mut self, credential: Credential) -> Result<(), SettingsError> {
        let mut settings = self.load();
        settings.apikey = Some(credential.as_str().to_string());
        self.save(&settings)?;
        debug!(path = %self.path.display(), "saved credential");
        Ok(())
    }
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    credential: Option<Credential>,
}

impl MemoryStore {
    pub fn with_credential(key: &str) -> Self {
        Self {
            credential: Some(Credential::new(key)),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn credential(&self) -> Option<Credential> {
        self.credential.clone().filter(|c| !c.is_empty())
    }

    fn set_credential(&mut self, credential: Credential) -> Result<(), SettingsError> {
        self.credential = Some(credential);
        Ok(())
    }
}
