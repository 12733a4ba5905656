//! JSON output formatting

use crate::outline::FileOutline;
use crate::token::TokenList;

/// Format outlines as JSON
pub fn format_outlines(outlines: &[FileOutline]) -> String {
    serde_json::to_string_pretty(outlines)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize outline: {}"}}"#, e))
}

/// Format tokens with their links as JSON
pub fn format_tokens(tokens: &TokenList) -> String {
    serde_json::to_string_pretty(tokens.tokens())
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize tokens: {}"}}"#, e))
}
