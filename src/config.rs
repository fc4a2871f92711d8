//! Configuration management for the highlighter
//!
//! Only two options influence tokenization: whether fenced divs get rotating
//! colors, and how many colors the rotation cycles through. Options are
//! persisted as JSON in the user's configuration directory.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application identifier following reverse-DNS convention
pub const APP_ID: &str = "com.cosmic.MarkdownHighlight";

/// File name of the persisted highlighter options
pub const CONFIG_FILE_NAME: &str = "highlight.json";

/// Default number of colors in the fenced div rotation
pub const DEFAULT_COLOR_COUNT: usize = 7;

/// Options read by the tokenizer engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Rotate colors across fenced div blocks
    pub rainbow_enabled: bool,

    /// Modulus for the color rotation
    pub color_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rainbow_enabled: true,
            color_count: DEFAULT_COLOR_COUNT,
        }
    }
}

impl EngineConfig {
    /// Check that every value is usable by the engine
    pub fn validate(&self) -> ConfigResult<()> {
        if self.color_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "colorCount".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from the user config directory or return defaults
    pub fn load() -> ConfigResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            log::debug!("No highlighter config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded highlighter config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to the user config directory
    pub fn save(&self) -> ConfigResult<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::SaveError {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::SaveError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the configuration directory path
    pub fn config_dir() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_ID))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Get the path of the persisted options file
    pub fn config_path() -> ConfigResult<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.rainbow_enabled);
        assert_eq!(config.color_count, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_uses_camel_case_keys() {
        let config = EngineConfig {
            rainbow_enabled: false,
            color_count: 3,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"rainbowEnabled\":false"));
        assert!(json.contains("\"colorCount\":3"));

        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"colorCount": 4}"#).unwrap();
        assert!(config.rainbow_enabled);
        assert_eq!(config.color_count, 4);
    }

    #[test]
    fn test_zero_color_count_rejected() {
        let config = EngineConfig {
            rainbow_enabled: true,
            color_count: 0,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = EngineConfig {
            rainbow_enabled: false,
            color_count: 5,
        };
        config.save_to(&path).unwrap();
        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            EngineConfig::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_rejects_zero_color_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"colorCount": 0}"#).unwrap();
        assert!(matches!(
            EngineConfig::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
