//! Configuration file discovery and loading

use super::DinghyConfig;
use crate::error::{DinghyError, Result};
use std::path::{Path, PathBuf};

/// Names searched in each directory, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[".dinghyrc.json", ".dinghyrc.toml", "dinghy.json"];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by walking up from `start_path`.
    ///
    /// A file path starts the search in its directory.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| DinghyError::config_error(format!("Invalid path: {e}")))?;
        if current.is_file() {
            current.pop();
        }

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }
            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<DinghyConfig> {
        DinghyConfig::load(path).map_err(|e| {
            DinghyError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load the given file, or discover one starting at `start`.
    ///
    /// A missing explicit file is an error; finding nothing during discovery
    /// yields the default configuration.
    pub fn load(custom_path: Option<&Path>, start: Option<&Path>) -> Result<DinghyConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(DinghyError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let start = start.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(start)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(DinghyConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_auto_discover_from_nested_file() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("docker/app");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "dinghy.json", r#"{"rules": {}}"#);
        let dockerfile = create_temp_config(&nested, "Dockerfile", "FROM alpine\n");

        let found = ConfigLoader::auto_discover(&dockerfile).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), "dinghy.json");
    }

    #[test]
    fn test_auto_discover_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "dinghy.json", "{}");
        create_temp_config(temp_dir.path(), ".dinghyrc.toml", "");
        create_temp_config(temp_dir.path(), ".dinghyrc.json", "{}");

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), ".dinghyrc.json");
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(
            temp_dir.path(),
            ".dinghyrc.toml",
            "[rules]\ncurlUseFlagF = \"off\"\n",
        );
        let config = ConfigLoader::load(None, Some(temp_dir.path())).unwrap();
        assert!(!config.is_enabled("curlUseFlagF"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.json")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), "dinghy.json", "{ invalid json }");
        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("dinghy.json"));
    }
}
