use crate::filter::{Profile, Selection};
use crate::storage::HostStorage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid volume mapping '{0}', expected VOLUME=DIR")]
    Volume(String),
}

/// Settings read from `config.toml`. Command line flags override them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host directory backing each volume prefix, e.g. `ux0 = "/mnt/vita/ux0"`.
    pub volumes: BTreeMap<String, PathBuf>,
    pub profile: Option<Profile>,
    pub selection: Selection,
    pub allowlist_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Default location: `<config dir>/vitasweep/config.toml`.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vitasweep/config.toml"))
    }

    /// Loads `path` if given, otherwise the default location. Only a missing
    /// default file yields the defaults; a missing explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from(path);
        }
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Selection with the configured profile applied on top.
    pub fn effective_selection(&self) -> Selection {
        match self.profile {
            Some(profile) => self.selection.with_profile(profile),
            None => self.selection,
        }
    }

    pub fn storage(&self) -> HostStorage {
        if self.volumes.is_empty() {
            tracing::warn!("no volumes mapped, every catalog path will read as absent");
        }
        HostStorage::new(self.volumes.clone())
    }

    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}

/// Parses a `VOLUME=DIR` command line mapping.
pub fn parse_volume(arg: &str) -> Result<(String, PathBuf), ConfigError> {
    match arg.split_once('=') {
        Some((volume, dir))
            if !volume.is_empty()
                && !dir.is_empty()
                && volume.bytes().all(|b| b.is_ascii_alphanumeric()) =>
        {
            Ok((volume.to_string(), PathBuf::from(dir)))
        }
        _ => Err(ConfigError::Volume(arg.to_string())),
    }
}
