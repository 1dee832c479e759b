//! User settings.
//!
//! Loaded from `<config dir>/splitfetch/config.json`. Every field is optional;
//! command-line flags take precedence over anything set here.
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("splitfetch/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of parts to split a resource into.
    pub parts: Option<usize>,
    /// Minimum size in bytes before splitting. `<= 0` forces a direct copy.
    pub min_split: Option<i64>,
    /// Fixed worker cap. `<= 0` computes it from the memory budget.
    pub max_workers: Option<i64>,
    /// Memory ceiling in bytes for in-flight ranges.
    pub memory_limit: Option<u64>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub default_dir: Option<String>,
}

impl Settings {
    /// Path of the settings file, if the platform has a config directory.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("splitfetch").join("config.json"))
    }

    /// Loads settings from the default location. A missing file is not an
    /// error and yields the defaults.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Builds the shared HTTP client.
    ///
    /// reqwest does not cap connections per host, so every worker can hold
    /// its own connection; the idle pool is sized to keep them all warm.
    pub fn client(&self, pool_size: usize) -> Result<Client> {
        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let timeout = self.timeout_secs.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(timeout))
            .pool_max_idle_per_host(pool_size.max(1))
            .build()
            .context("Failed to build HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_fills_the_rest_with_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{ "parts": 8, "min_split": 0 }}"#)?;

        let settings = Settings::load_from(file.path())?;
        assert_eq!(settings.parts, Some(8));
        assert_eq!(settings.min_split, Some(0));
        assert_eq!(settings.max_workers, None);
        assert!(settings.user_agent.is_none());
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "parts = 8")?;

        assert!(Settings::load_from(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn client_builds_from_defaults() {
        assert!(Settings::default().client(4).is_ok());
    }
}
