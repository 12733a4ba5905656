//! Tokens command implementation

use crate::cli::{OutputFormat, TokensArgs};
use crate::config::Config;
use crate::graph::TokenGraphBuilder;
use crate::output;
use crate::token::LexFlags;
use anyhow::{Context, Result};
use tracing::info;

/// Run the tokens command
pub fn run(args: TokensArgs) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let mut flags = config.lexer.flags();
    if args.code {
        flags |= LexFlags::DISCARD_TRIVIA;
    }

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let tokens = TokenGraphBuilder::new(flags)
        .build_bytes(&bytes)
        .with_context(|| format!("Failed to tokenize {}", args.file.display()))?;

    info!(file = %args.file.display(), tokens = tokens.len(), "tokenized file");
    if flags.contains(LexFlags::MATCH_BRACKETS) {
        if let Err(e) = tokens.check_balanced() {
            tracing::warn!(file = %args.file.display(), "{}", e);
        }
    }

    let format = OutputFormat::from_json_flag(args.json);
    print!("{}", output::format_tokens(&tokens, format));
    Ok(())
}
