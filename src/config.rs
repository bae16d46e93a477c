//! Engine Configuration - resource limits

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Invalid config {0}: {1}")]
    Parse(String, #[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_max_figures")]
    pub max_figures: usize,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
}

fn default_max_figures() -> usize { 10 }
fn default_max_image_bytes() -> usize { 5 * 1024 * 1024 }
fn default_max_title_length() -> usize { 50 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_figures: default_max_figures(),
            max_image_bytes: default_max_image_bytes(),
            max_title_length: default_max_title_length(),
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let name = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(name.clone(), e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_figures, 10);
        assert_eq!(config.max_image_bytes, 5_242_880);
        assert_eq!(config.max_title_length, 50);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"maxFigures": 3, "unknown": true}}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.max_figures, 3);
        assert_eq!(config.max_image_bytes, 5_242_880);
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "maxFigures = 3").unwrap();

        let err = EngineConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/paperforge.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
