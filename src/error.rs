use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while turning source text into tokens.
///
/// All of these are fatal: the lexer never returns a partial token list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unterminated string literal starting on line {line}")]
    UnterminatedString { line: u32 },

    #[error("Unterminated comment starting on line {line}")]
    UnterminatedComment { line: u32 },

    #[error("Unterminated heredoc '{label}' starting on line {line}")]
    UnterminatedHeredoc { label: String, line: u32 },

    #[error("Unexpected character {ch:?} on line {line}")]
    UnexpectedCharacter { ch: char, line: u32 },

    #[error("Invalid UTF-8 sequence at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Unmatched '{text}' on line {line}")]
    UnmatchedCloser { text: String, line: u32 },

    #[error("Unclosed '{text}' on line {line}")]
    UnclosedBracket { text: String, line: u32 },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Structural error on line {line}: {message}")]
    Structural { message: String, line: u32 },

    #[error("Usage error: {message}")]
    Usage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn structural(line: u32, message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
            line,
        }
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }
}
