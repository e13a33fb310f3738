use std::{fs, path::PathBuf};

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{ChurnError, Result};

/// Default API host; compiled in like the browser original, overridable via
/// config or `--api-base`.
pub const DEFAULT_API_BASE: &str = "https://jobsgiap.com";

/// Tokens debited from the local ledger per AI answer
pub const DEFAULT_TOKEN_COST: f64 = 0.6;

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Churchen API
    pub api_base: String,

    /// Base URL of the separate drafts ingest host, if any
    pub drafts_base: Option<String>,

    /// Tokens debited per AI answer
    pub token_cost: f64,

    /// Default page size for the feed
    pub feed_limit: usize,

    /// Directory holding the token ledger and session files
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: DEFAULT_API_BASE.to_string(),
            drafts_base: None,
            token_cost: DEFAULT_TOKEN_COST,
            feed_limit: 20,
            data_dir: default_data_dir(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "churchen", "churchen")
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

impl Config {
    /// Loads configuration from `path` (or the default location), falling
    /// back to defaults when no file exists.
    pub fn load(path: Option<PathBuf>) -> Result<Config> {
        let path = path.unwrap_or_else(default_config_path);
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content).map_err(|e| ChurnError::ConfigError {
            message: format!("Invalid config file {}: {}", path.display(), e),
        })?;
        Ok(config)
    }

    /// Saves configuration to `path` (or the default location).
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let path = path.unwrap_or_else(default_config_path);
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|_| ChurnError::DirectoryError {
                    path: parent.to_path_buf(),
                })?;
            }
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Applies a `key=value` setting.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| ChurnError::ConfigError {
            message: format!("Expected key=value, got: {}", assignment),
        })?;
        match key.trim() {
            "api_base" => self.api_base = value.trim().trim_end_matches('/').to_string(),
            "drafts_base" => {
                let v = value.trim().trim_end_matches('/');
                self.drafts_base = if v.is_empty() { None } else { Some(v.to_string()) };
            }
            "token_cost" => {
                self.token_cost = value.trim().parse().map_err(|_| ChurnError::ConfigError {
                    message: format!("token_cost must be a number, got: {}", value),
                })?
            }
            "feed_limit" => {
                self.feed_limit = value.trim().parse().map_err(|_| ChurnError::ConfigError {
                    message: format!("feed_limit must be an integer, got: {}", value),
                })?
            }
            "data_dir" => self.data_dir = PathBuf::from(value.trim()),
            other => {
                return Err(ChurnError::ConfigError {
                    message: format!("Unknown config key: {}", other),
                })
            }
        }
        Ok(())
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("tokens.json")
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.token_cost, DEFAULT_TOKEN_COST);
        assert_eq!(config.feed_limit, 20);
        assert!(config.drafts_base.is_none());
    }

    #[test]
    fn test_set_known_keys() {
        let mut config = Config::default();
        config.set("api_base=https://example.test/").unwrap();
        assert_eq!(config.api_base, "https://example.test");
        config.set("token_cost=1.5").unwrap();
        assert_eq!(config.token_cost, 1.5);
        config.set("drafts_base=https://drafts.test").unwrap();
        assert_eq!(config.drafts_base.as_deref(), Some("https://drafts.test"));
        config.set("drafts_base=").unwrap();
        assert!(config.drafts_base.is_none());
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set("no_equals_sign").is_err());
        assert!(config.set("unknown=1").is_err());
        assert!(config.set("token_cost=abc").is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.set("api_base=https://example.test").unwrap();
        config.save(Some(path.clone())).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded.api_base, "https://example.test");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("nope.json"))).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }
}
