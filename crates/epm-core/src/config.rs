//! EPM configuration, read from `<data_dir>/config.toml`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use epm_protocol::Provider;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::persistence::PROFILES_KEY;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "EPM_DATA_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Errors while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("reading {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML for [`EpmConfig`]
    #[error("parsing {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
}

/// Tunable behavior of the profile manager and its storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpmConfig {
    /// Key under which the profile list is stored
    pub storage_key: String,
    /// Label appended to the name of a duplicated profile
    pub copy_suffix: String,
    /// Provider selected after the active configuration is cleared
    pub default_provider: Provider,
}

impl Default for EpmConfig {
    fn default() -> Self {
        Self {
            storage_key: PROFILES_KEY.to_string(),
            copy_suffix: " (copy)".to_string(),
            default_provider: Provider::default(),
        }
    }
}

impl EpmConfig {
    /// Load `config.toml` from `dir`. A missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Data directory: `$EPM_DATA_DIR`, else `<local data dir>/epm-workbench`.
    pub fn data_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        let mut base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        base.push("epm-workbench");
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_default() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(EpmConfig::load(dir.path())?, EpmConfig::default());
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(CONFIG_FILE),
            "copy_suffix = \" (副本)\"\ndefault_provider = \"Azure\"\n",
        )?;

        let config = EpmConfig::load(dir.path())?;
        assert_eq!(config.copy_suffix, " (副本)");
        assert_eq!(config.default_provider, Provider::Azure);
        assert_eq!(config.storage_key, PROFILES_KEY);
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE), "default_provider = \"Nope\"")?;
        assert!(matches!(
            EpmConfig::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
        Ok(())
    }
}
