//! Editor configuration.
//!
//! Read from `<config dir>/start-editor/config.toml`. Every section is
//! optional; missing fields fall back to their defaults.
//!
//! ```toml
//! [editor]
//! editable = true
//! placeholder = "Write something..."
//! undo_depth = 200
//!
//! [styles.paragraph]
//! lineHeight = "1.6"
//!
//! [extensions.shortcuts]
//! marks = ["bold", "italic"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use start_engine::HistoryOptions;

use crate::style::StyleObject;

/// Main editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor behavior settings
    pub editor: EditorConfig,

    /// Default style objects per content type
    pub styles: BTreeMap<String, StyleObject>,

    /// Option overrides per built-in extension id
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Config {
    /// Loads config from the default location.
    pub fn load() -> Self {
        Self::load_from_default_path().unwrap_or_default()
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("start-editor").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Editor behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether the surface accepts edits
    pub editable: bool,

    /// Text shown while the document is empty
    pub placeholder: Option<String>,

    /// Undo groups kept in history
    pub undo_depth: usize,

    /// Edits closer together than this (ms) undo as one group
    pub new_group_delay_ms: u64,
}

impl EditorConfig {
    pub fn history_options(&self) -> HistoryOptions {
        HistoryOptions {
            depth: self.undo_depth,
            new_group_delay: Duration::from_millis(self.new_group_delay_ms),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            editable: true,
            placeholder: None,
            undo_depth: 100,
            new_group_delay_ms: 500,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.editor.editable);
        assert_eq!(config.editor.undo_depth, 100);
        assert!(config.styles.is_empty());
    }

    #[test]
    fn test_partial_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [editor]
            placeholder = "Type here"

            [styles.flexBox]
            gap = "12px"

            [extensions.shortcuts]
            marks = ["bold"]
            "#,
        )
        .unwrap();
        assert!(config.editor.editable);
        assert_eq!(config.editor.placeholder.as_deref(), Some("Type here"));
        assert_eq!(config.styles["flexBox"]["gap"], "12px");
        assert_eq!(config.extensions["shortcuts"]["marks"][0], "bold");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.editor.undo_depth = 7;
        config
            .styles
            .insert("paragraph".into(), StyleObject::from([("color".into(), "red".into())]));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.editor.history_options().depth, 7);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[editor\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
