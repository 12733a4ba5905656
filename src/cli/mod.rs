//! CLI command definitions and handlers

pub mod outline;
pub mod tokens;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_ABOUT: &str = r#"
Inspect how PHP source is tokenized, linked and decomposed.

COMMANDS:
    phpnav tokens <file>      Dump the linked token graph of one file
    phpnav outline <path>     Outline namespaces, imports, types and members

CONFIGURATION:
    Settings are read from $PHPNAV_CONFIG, or config.toml in the
    platform config directory. Set PHPNAV_LOG=debug for tracing output.
"#;

/// PHP token graph and outline inspector
#[derive(Parser, Debug)]
#[command(name = "phpnav")]
#[command(author, version)]
#[command(about = "PHP token graph and outline inspector")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump the linked token graph of a file
    #[command(visible_alias = "t")]
    Tokens(TokensArgs),

    /// Outline a PHP file or every PHP file under a directory
    #[command(visible_alias = "o")]
    Outline(OutlineArgs),
}

/// Arguments for the tokens command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    phpnav tokens src/User.php            One line per token with its links
    phpnav tokens src/User.php --code     Hide whitespace and comments
    phpnav tokens src/User.php --json     JSON output")]
pub struct TokensArgs {
    /// PHP file to tokenize
    pub file: PathBuf,

    /// Drop trivia before linking
    #[arg(long)]
    pub code: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the outline command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    phpnav outline src/User.php          Outline one file
    phpnav outline src                   Outline every PHP file under src
    phpnav outline . --json              JSON output")]
pub struct OutlineArgs {
    /// File or directory (default: current directory)
    pub path: Option<PathBuf>,

    /// Omit default values of properties and constants
    #[arg(long)]
    pub no_values: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Human
        }
    }
}
