//! Configuration file support for omniguard.
//!
//! Loads optional TOML config from `~/.config/omniguard/config.toml`.
//! Command-line flags override every field.

use crate::scanner::ALL_PATTERNS;
use crate::scoring::Sensitivity;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 15;

/// Application configuration loaded from TOML file.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Blocking policy (default: medium)
    pub sensitivity: Option<Sensitivity>,
    /// Scanners to run (default: all)
    pub categories: Option<Vec<String>>,
    /// Reasoning service URL for `analyze-tx --remote`
    pub remote_endpoint: Option<String>,
    /// Bearer token for the reasoning service
    pub remote_api_key: Option<String>,
    /// Remote call budget in seconds (default: 15)
    pub remote_timeout_secs: Option<u64>,
}

/// `~/.config/omniguard/config.toml`
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join("omniguard")
        .join("config.toml")
}

impl Config {
    /// Load config from the default path, falling back to defaults on any error.
    pub fn load() -> Self {
        Self::load_from(&default_path())
    }

    /// Load config from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "loaded config");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity.unwrap_or_default()
    }

    /// Configured scanner names, unknown names dropped
    pub fn categories(&self) -> Vec<String> {
        match &self.categories {
            Some(list) if !list.is_empty() => list
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| ALL_PATTERNS.contains(&c.as_str()))
                .collect(),
            _ => ALL_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs.unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.sensitivity(), Sensitivity::Medium);
        assert_eq!(config.categories().len(), ALL_PATTERNS.len());
        assert_eq!(config.remote_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_loads_all_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
sensitivity = "high"
categories = ["cards", "PII", "bogus"]
remote_endpoint = "https://reasoner.example/v1/analyze"
remote_api_key = "k"
remote_timeout_secs = 5
"#
        )
        .unwrap();

        let config = Config::load_from(file.path());
        assert_eq!(config.sensitivity(), Sensitivity::High);
        assert_eq!(config.categories(), vec!["cards", "pii"]);
        assert_eq!(config.remote_endpoint.as_deref(), Some("https://reasoner.example/v1/analyze"));
        assert_eq!(config.remote_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_toml_gives_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sensitivity = \"extreme\"").unwrap();
        assert_eq!(Config::load_from(file.path()), Config::default());
    }
}
