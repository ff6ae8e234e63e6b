//! Game configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration. Command-line flags override file values in the apps.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid window size {width}x{height}")]
    InvalidWindowSize { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "woodgas".into(),
            width: 640,
            height: 480,
            vsync: true,
        }
    }
}

impl WindowConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub clear_color: [f32; 4],
    /// Default tracing filter when `--verbose` is not given.
    pub log_level: String,
    /// Scene script to run from disk.
    pub script: Option<PathBuf>,
    /// Asset pack to load scripts and images from.
    pub pack: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_color: [0.1, 0.1, 0.15, 1.0],
            log_level: "info".into(),
            script: None,
            pack: None,
        }
    }
}

impl GameConfig {
    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded game config");
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidWindowSize {
                width: self.window.width,
                height: self.window.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_a_640x480_window() {
        let config = GameConfig::default();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 480);
        assert!((config.window.aspect_ratio() - 640.0 / 480.0).abs() < 1e-6);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = GameConfig::from_yaml("window:\n  title: tiles\nlog_level: debug\n").unwrap();
        assert_eq!(config.window.title, "tiles");
        assert_eq!(config.window.width, 640);
        assert_eq!(config.log_level, "debug");
        assert!(config.script.is_none());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(GameConfig::from_yaml("").unwrap(), GameConfig::default());
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game.yaml");
        std::fs::write(&path, "script: scene.rhai\nclear_color: [1.0, 0.0, 1.0, 1.0]\n").unwrap();

        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.script, Some(PathBuf::from("scene.rhai")));
        assert_eq!(config.clear_color, [1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn zero_sized_window_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game.yaml");
        std::fs::write(&path, "window:\n  width: 0\n").unwrap();

        assert!(matches!(
            GameConfig::load(&path),
            Err(ConfigError::InvalidWindowSize { width: 0, .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = GameConfig::load("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
        assert!(GameConfig::load_or_default(None).is_ok());
    }
}
