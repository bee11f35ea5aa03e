use crate::error::ConfigError;
use crate::width::ColumnPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default ActiveBuffer growth quantum (2**N)
pub const DEFAULT_BUFFER_BLOCK: usize = 2048;

/// Immutable editor configuration, built once and handed to `Editor::new`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Count columns by grapheme cluster and East-Asian width
    pub unicode_combining: bool,
    /// Where `*AUTOSAVE*` artifacts are written (default: beside the file)
    pub autosave_dir: Option<PathBuf>,
    /// ActiveBuffer growth quantum, a power of two
    pub buffer_block: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            unicode_combining: false,
            autosave_dir: None,
            buffer_block: DEFAULT_BUFFER_BLOCK,
        }
    }
}

impl EditorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = toml::from_str(content)?;
        config.validate()
    }

    /// Load `<config_dir>/edcore/config.toml`, falling back to defaults when
    /// the file does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("edcore").join("config.toml"))
    }

    pub fn column_policy(&self) -> ColumnPolicy {
        if self.unicode_combining {
            ColumnPolicy::Unicode
        } else {
            ColumnPolicy::Codepoint
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !self.buffer_block.is_power_of_two() {
            return Err(ConfigError::InvalidValue(format!(
                "buffer_block must be a power of two, got {}",
                self.buffer_block
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert!(!config.unicode_combining);
        assert!(config.autosave_dir.is_none());
        assert_eq!(config.buffer_block, DEFAULT_BUFFER_BLOCK);
        assert_eq!(config.column_policy(), ColumnPolicy::Codepoint);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EditorConfig::from_toml("unicode_combining = true\n").unwrap();
        assert!(config.unicode_combining);
        assert_eq!(config.buffer_block, DEFAULT_BUFFER_BLOCK);
        assert_eq!(config.column_policy(), ColumnPolicy::Unicode);
    }

    #[test]
    fn test_rejects_odd_block_size() {
        let result = EditorConfig::from_toml("buffer_block = 1000\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = EditorConfig::from_toml("unicode_combining = \"maybe\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "autosave_dir = \"/tmp/autosave\"\nbuffer_block = 4096\n").unwrap();

        let config = EditorConfig::from_file(&path).unwrap();
        assert_eq!(config.autosave_dir, Some(PathBuf::from("/tmp/autosave")));
        assert_eq!(config.buffer_block, 4096);
    }

    #[test]
    fn test_missing_file() {
        let result = EditorConfig::from_file(Path::new("/nonexistent/edcore.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
