//! Output formatting

pub mod human;
pub mod json;

use crate::cli::OutputFormat;
use crate::outline::FileOutline;
use crate::token::TokenList;

/// Format file outlines for output
pub fn format_outlines(outlines: &[FileOutline], format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => human::format_outlines(outlines),
        OutputFormat::Json => json::format_outlines(outlines),
    }
}

/// Format a linked token list for output
pub fn format_tokens(tokens: &TokenList, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => human::format_tokens(tokens),
        OutputFormat::Json => json::format_tokens(tokens),
    }
}
