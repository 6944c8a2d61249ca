//! Client configuration

use std::path::{Path, PathBuf};

use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::storage::default_storage_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the task API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Cookie-issuing endpoint for the session/CSRF pre-flight
    #[serde(default = "default_csrf_url")]
    pub csrf_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Path of the durable key-value storage file
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_csrf_url() -> String {
    "http://localhost:8000/sanctum/csrf-cookie".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            csrf_url: default_csrf_url(),
            timeout_ms: default_timeout_ms(),
            storage_path: default_storage_path(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults.
    ///
    /// `YATL_API_URL` and `YATL_CSRF_URL` override whatever was loaded.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(path)?;

        if let Ok(url) = std::env::var("YATL_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var("YATL_CSRF_URL") {
            config.csrf_url = url;
        }

        Ok(config)
    }

    fn load_file(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("yatl").join("config.yml")),
            Some(PathBuf::from("yatl.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "api_url: https://tasks.example.com/api\n").expect("write");

        let config = Config::load(Some(&path)).expect("load");
        assert_eq!(config.api_url, "https://tasks.example.com/api");
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.yml");

        let mut config = Config::default();
        config.timeout_ms = 5_000;
        config.save(&path).expect("save");

        let loaded = Config::load(Some(&path)).expect("load");
        assert_eq!(loaded.timeout_ms, 5_000);
    }
}
