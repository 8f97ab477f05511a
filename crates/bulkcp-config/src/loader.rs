//! Configuration loader utilities

use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default locations
    pub fn load_default() -> ConfigResult<Config> {
        let mut builder = ConfigBuilder::new().add_defaults();

        // Use the first config file found in the default locations
        for path in Self::default_config_paths() {
            if path.exists() {
                builder = builder.add_source_file(&path);
                break;
            }
        }

        builder.add_env_prefix("BULKCP").build()
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Configuration file not found",
                ),
            });
        }

        ConfigBuilder::new()
            .add_defaults()
            .add_source_file(path)
            .add_env_prefix("BULKCP")
            .build()
    }

    /// Save configuration to a file, with the format chosen by extension
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::to_string_pretty(config).map_err(|e| {
                ConfigError::Serialization {
                    message: format!("Failed to serialize to TOML: {}", e),
                }
            })?,
            Some("json") => serde_json::to_string_pretty(config).map_err(|e| {
                ConfigError::Serialization {
                    message: format!("Failed to serialize to JSON: {}", e),
                }
            })?,
            _ => serde_yaml::to_string(config).map_err(|e| ConfigError::Serialization {
                message: format!("Failed to serialize to YAML: {}", e),
            })?,
        };

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&Config::default(), path)
    }

    /// Check if a configuration file exists in default locations
    pub fn config_exists() -> Option<PathBuf> {
        Self::default_config_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    /// Default configuration file paths in order of preference
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("bulkcp.yaml"),
            PathBuf::from("bulkcp.yml"),
            PathBuf::from("bulkcp.toml"),
            PathBuf::from(".bulkcp.yaml"),
            PathBuf::from(".bulkcp.yml"),
            PathBuf::from(".bulkcp.toml"),
        ];

        #[cfg(unix)]
        {
            paths.push(PathBuf::from("/etc/bulkcp/config.yaml"));
            paths.push(PathBuf::from("/etc/bulkcp/config.yml"));
            paths.push(PathBuf::from("/etc/bulkcp/config.toml"));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default() {
        let config = ConfigLoader::load_default().unwrap();
        assert!(config.copy.preserve_metadata);
    }

    #[test]
    fn test_save_and_load_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        ConfigLoader::generate_default_config(&path).unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();

        assert_eq!(config.copy.chunk_size.get(), 1024 * 1024);
    }

    #[test]
    fn test_save_and_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        ConfigLoader::generate_default_config(&path).unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();

        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::load_from_file(temp_dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
