//! Token Graph Builder
//!
//! Annotates a flat token list in place with raw neighbour links,
//! trivia-skipping links and bracket-nesting links.
//!
//! @module graph

use crate::error::LexError;
use crate::lex;
use crate::token::{LexFlags, Taxonomy, Token, TokenList};
use tracing::debug;

/// Builds linked `TokenList`s from source text or pre-lexed tokens
#[derive(Debug, Clone, Copy)]
pub struct TokenGraphBuilder {
    taxonomy: Taxonomy,
    flags: LexFlags,
}

impl TokenGraphBuilder {
    /// Create a builder for the PHP taxonomy
    pub fn new(flags: LexFlags) -> Self {
        Self::with_taxonomy(Taxonomy::PHP, flags)
    }

    pub fn with_taxonomy(taxonomy: Taxonomy, flags: LexFlags) -> Self {
        Self { taxonomy, flags }
    }

    pub fn flags(&self) -> LexFlags {
        self.flags
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Lex and link UTF-8 source
    pub fn build(&self, source: &str) -> Result<TokenList, LexError> {
        self.link(lex::tokenize(source)?)
    }

    /// Lex and link raw bytes, rejecting invalid UTF-8
    pub fn build_bytes(&self, bytes: &[u8]) -> Result<TokenList, LexError> {
        self.link(lex::tokenize_bytes(bytes)?)
    }

    /// Link tokens produced by any lexer that speaks this builder's taxonomy.
    ///
    /// Incoming link fields are overwritten. Each `prev_code` reuses the
    /// previous token's pointer when that token is trivia, and `next_code`
    /// does the same from the other end, so runs of trivia cost O(1) per
    /// token.
    pub fn link(&self, mut tokens: Vec<Token>) -> Result<TokenList, LexError> {
        if self.flags.contains(LexFlags::DISCARD_TRIVIA) {
            tokens.retain(|t| self.taxonomy.is_code(t.kind));
        }

        let n = tokens.len();
        let match_brackets = self.flags.contains(LexFlags::MATCH_BRACKETS);
        let mut open: Vec<usize> = Vec::new();

        for i in 0..n {
            let prev_code = match i.checked_sub(1) {
                Some(p) if self.taxonomy.is_trivia(tokens[p].kind) => tokens[p].prev_code,
                p => p,
            };

            let token = &mut tokens[i];
            token.index = i;
            token.prev = i.checked_sub(1);
            token.next = (i + 1 < n).then_some(i + 1);
            token.prev_code = prev_code;
            token.parent = None;
            token.opened_by = None;
            token.closed_by = None;

            if !match_brackets {
                continue;
            }

            token.parent = open.last().copied();
            let kind = token.kind;

            if self.taxonomy.is_opener(kind) {
                open.push(i);
            } else if self.taxonomy.is_closer(kind) {
                let Some(opener) = open.pop() else {
                    return Err(LexError::UnmatchedCloser {
                        text: token.text.to_string(),
                        line: token.line,
                    });
                };
                let grandparent = tokens[opener].parent;
                tokens[opener].closed_by = Some(i);
                tokens[i].opened_by = Some(opener);
                tokens[i].parent = grandparent;
            }
        }

        for i in (0..n).rev() {
            tokens[i].next_code = match tokens.get(i + 1) {
                Some(next) if self.taxonomy.is_trivia(next.kind) => next.next_code,
                Some(_) => Some(i + 1),
                None => None,
            };
        }

        debug!(
            tokens = n,
            unclosed = open.len(),
            brackets = match_brackets,
            "linked token graph"
        );

        Ok(TokenList::from_linked(tokens, self.flags, self.taxonomy))
    }
}

impl Default for TokenGraphBuilder {
    fn default() -> Self {
        Self::new(LexFlags::default())
    }
}
