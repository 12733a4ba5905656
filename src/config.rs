//! Configuration management

use crate::error::{Error, Result};
use crate::token::LexFlags;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default cap on the size of files the outliner reads
pub const MAX_FILE_SIZE: u64 = 1_048_576;

/// Global configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lexer: LexerConfig,
    pub outline: OutlineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexerConfig {
    /// Pair brackets while linking (always on for outlines)
    pub match_brackets: bool,
    /// Keep whitespace, comments and tags in the token list
    pub retain_trivia: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// File extensions treated as PHP when walking directories
    pub extensions: Vec<String>,
    /// Maximum file size to outline (bytes)
    pub max_file_size: u64,
    /// Include default values of properties and constants
    pub include_values: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            match_brackets: true,
            retain_trivia: true,
        }
    }
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["php".to_string()],
            max_file_size: MAX_FILE_SIZE,
            include_values: true,
        }
    }
}

impl LexerConfig {
    pub fn flags(&self) -> LexFlags {
        let mut flags = LexFlags::empty();
        flags.set(LexFlags::MATCH_BRACKETS, self.match_brackets);
        flags.set(LexFlags::DISCARD_TRIVIA, !self.retain_trivia);
        flags
    }
}

impl OutlineConfig {
    /// Whether `path` has one of the configured extensions
    pub fn matches(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl Config {
    /// Load configuration from `$PHPNAV_CONFIG` or the default location
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("PHPNAV_CONFIG") {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(Error::ConfigNotFound { path });
            }
            return Self::load_from(&path);
        }

        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load and validate a specific configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("dev", "phpnav", "phpnav")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| Error::Config {
                message: "Could not determine the configuration directory".to_string(),
            })
    }

    pub fn validate(&self) -> Result<()> {
        if self.outline.extensions.is_empty() {
            return Err(Error::Config {
                message: "outline.extensions must not be empty".to_string(),
            });
        }
        if self.outline.max_file_size == 0 {
            return Err(Error::Config {
                message: "outline.max_file_size must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.lexer.match_brackets);
        assert!(config.lexer.retain_trivia);
        assert_eq!(config.lexer.flags(), LexFlags::MATCH_BRACKETS);
        assert_eq!(config.outline.extensions, vec!["php"]);
        assert_eq!(config.outline.max_file_size, MAX_FILE_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config("[lexer]\nretain_trivia = false\n");
        let config = Config::load_from(file.path()).unwrap();
        assert!(config.lexer.match_brackets);
        assert_eq!(
            config.lexer.flags(),
            LexFlags::MATCH_BRACKETS | LexFlags::DISCARD_TRIVIA
        );
        assert_eq!(config.outline, OutlineConfig::default());
    }

    #[test]
    fn test_load_outline_section() {
        let file = write_config(
            "[outline]\nextensions = [\"php\", \"phtml\"]\nmax_file_size = 2048\ninclude_values = false\n",
        );
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.outline.max_file_size, 2048);
        assert!(!config.outline.include_values);
        assert!(config.outline.matches(Path::new("views/index.PHTML")));
        assert!(!config.outline.matches(Path::new("README.md")));
    }

    #[test]
    fn test_invalid_files() {
        let file = write_config("[lexer\n");
        assert!(matches!(
            Config::load_from(file.path()),
            Err(Error::TomlParse(_))
        ));

        let file = write_config("[outline]\nextensions = []\n");
        assert!(matches!(
            Config::load_from(file.path()),
            Err(Error::Config { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("missing.toml")),
            Err(Error::ConfigNotFound { .. })
        ));
    }
}
