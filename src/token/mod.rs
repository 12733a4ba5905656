//! Token Arena
//!
//! Tokens live in an index-addressed arena (`TokenList`). Every navigation
//! field is an `Option<usize>` into the same arena, so the cyclic
//! prev/next/parent graph carries no ownership.
//!
//! @module token

mod kind;
mod taxonomy;

pub use kind::{KindSet, TokenKind};
pub use taxonomy::Taxonomy;

use crate::error::{Error, LexError, Result};
use bitflags::bitflags;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

// =============================================================================
// LEX FLAGS
// =============================================================================

bitflags! {
    /// Options controlling how a token graph is built
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[repr(transparent)]
    pub struct LexFlags: u8 {
        /// Pair brackets and assign `parent`/`opened_by`/`closed_by`
        const MATCH_BRACKETS = 0b0000_0001;
        /// Drop trivia tokens before linking
        const DISCARD_TRIVIA = 0b0000_0010;
    }
}

impl Default for LexFlags {
    fn default() -> Self {
        Self::MATCH_BRACKETS
    }
}

// =============================================================================
// TOKEN
// =============================================================================

/// A lexical token plus its navigation links.
///
/// `kind`, `text`, `offset` and `line` are fixed at lex time. The link fields
/// are assigned once by the graph builder and hold arena indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: CompactString,
    /// Byte offset in the source
    pub offset: usize,
    /// 1-indexed line
    pub line: u32,
    /// Position in the owning arena
    pub index: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    /// Nearest preceding non-trivia token
    pub prev_code: Option<usize>,
    /// Nearest following non-trivia token
    pub next_code: Option<usize>,
    /// Innermost open bracket enclosing this token
    pub parent: Option<usize>,
    pub opened_by: Option<usize>,
    pub closed_by: Option<usize>,
}

impl Token {
    /// Create an unlinked token as produced by a lexer
    pub fn new(kind: TokenKind, text: impl Into<CompactString>, offset: usize, line: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
            line,
            index: 0,
            prev: None,
            next: None,
            prev_code: None,
            next_code: None,
            parent: None,
            opened_by: None,
            closed_by: None,
        }
    }

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Byte offset just past the end of this token
    pub fn end_offset(&self) -> usize {
        self.offset + self.text.len()
    }
}

// =============================================================================
// TOKEN LIST
// =============================================================================

/// A linked token arena
#[derive(Debug, Clone)]
pub struct TokenList {
    tokens: Vec<Token>,
    flags: LexFlags,
    taxonomy: Taxonomy,
}

impl TokenList {
    pub(crate) fn from_linked(tokens: Vec<Token>, flags: LexFlags, taxonomy: Taxonomy) -> Self {
        Self {
            tokens,
            flags,
            taxonomy,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn flags(&self) -> LexFlags {
        self.flags
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Concatenated text of every token
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Fail on the first opener that never found its closer
    pub fn check_balanced(&self) -> std::result::Result<(), LexError> {
        match self
            .tokens
            .iter()
            .find(|t| self.taxonomy.is_opener(t.kind) && t.closed_by.is_none())
        {
            Some(open) => Err(LexError::UnclosedBracket {
                text: open.text.to_string(),
                line: open.line,
            }),
            None => Ok(()),
        }
    }

    /// Detached copy of the tokens strictly between `opener` and its closer.
    ///
    /// The copy is re-indexed from zero. Links that pointed at the brackets
    /// or anywhere outside the interior are cleared.
    pub fn inner_tokens(&self, opener: usize) -> Result<TokenList> {
        let open = self
            .tokens
            .get(opener)
            .ok_or_else(|| Error::usage(format!("token {} is out of range", opener)))?;
        if !self.taxonomy.is_opener(open.kind) {
            return Err(Error::usage(format!(
                "'{}' on line {} is not an opening bracket",
                open.text, open.line
            )));
        }
        let close = open.closed_by.ok_or_else(|| LexError::UnclosedBracket {
            text: open.text.to_string(),
            line: open.line,
        })?;

        let start = opener + 1;
        let relink = |link: Option<usize>| link.filter(|&i| i > opener && i < close).map(|i| i - start);

        let tokens = self.tokens[start..close]
            .iter()
            .map(|t| Token {
                index: t.index - start,
                prev: relink(t.prev),
                next: relink(t.next),
                prev_code: relink(t.prev_code),
                next_code: relink(t.next_code),
                parent: relink(t.parent),
                opened_by: relink(t.opened_by),
                closed_by: relink(t.closed_by),
                ..t.clone()
            })
            .collect();

        Ok(TokenList::from_linked(tokens, self.flags, self.taxonomy))
    }

    /// Check whether the declaration header containing `index` includes a
    /// token of `kind`.
    ///
    /// Walks `prev_code` and then `next_code` from `index` for as long as the
    /// visited tokens are declaration parts.
    pub fn is_declaration_of(&self, index: usize, kind: TokenKind) -> bool {
        let parts = self.taxonomy.declaration_parts;
        let Some(start) = self.tokens.get(index) else {
            return false;
        };
        if !parts.contains(start.kind) {
            return false;
        }
        if start.kind == kind {
            return true;
        }

        let mut cursor = start.prev_code;
        while let Some(t) = cursor.map(|i| &self.tokens[i]) {
            if !parts.contains(t.kind) {
                break;
            }
            if t.kind == kind {
                return true;
            }
            cursor = t.prev_code;
        }

        let mut cursor = start.next_code;
        while let Some(t) = cursor.map(|i| &self.tokens[i]) {
            if !parts.contains(t.kind) {
                break;
            }
            if t.kind == kind {
                return true;
            }
            cursor = t.next_code;
        }

        false
    }
}

impl std::ops::Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TokenGraphBuilder;

    fn build(source: &str) -> TokenList {
        TokenGraphBuilder::new(LexFlags::MATCH_BRACKETS)
            .build(source)
            .unwrap()
    }

    fn find(list: &TokenList, text: &str) -> usize {
        list.iter().position(|t| t.text == text).unwrap()
    }

    #[test]
    fn test_inner_tokens_empty_block() {
        let list = build("<?php function f() {}");
        let open = find(&list, "{");
        let inner = list.inner_tokens(open).unwrap();
        assert!(inner.is_empty());
    }

    #[test]
    fn test_inner_tokens_detached_and_reindexed() {
        let list = build("<?php { X }");
        let open = find(&list, "{");
        let inner = list.inner_tokens(open).unwrap();

        let texts: Vec<&str> = inner.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec![" ", "X", " "]);
        for (i, t) in inner.iter().enumerate() {
            assert_eq!(t.index, i);
            assert_eq!(t.parent, None);
        }
        assert_eq!(inner[0].prev, None);
        assert_eq!(inner[2].next, None);
        assert_eq!(inner[1].prev_code, None);
        assert_eq!(inner[1].next_code, None);
        assert_eq!(inner[1].prev, Some(0));
        assert_eq!(inner[1].next, Some(2));
        assert_eq!(inner[0].next_code, Some(1));
    }

    #[test]
    fn test_inner_tokens_keeps_nested_pairs() {
        let list = build("<?php f(a[1], (2));");
        let open = find(&list, "(");
        let inner = list.inner_tokens(open).unwrap();
        assert_eq!(inner.text(), "a[1], (2)");
        assert!(inner.check_balanced().is_ok());

        let bracket = inner.iter().position(|t| t.text == "[").unwrap();
        let closer = inner[bracket].closed_by.unwrap();
        assert_eq!(inner[closer].text, "]");
        assert_eq!(inner[closer].opened_by, Some(bracket));
        assert_eq!(inner[bracket + 1].parent, Some(bracket));
    }

    #[test]
    fn test_inner_tokens_rejects_non_opener() {
        let list = build("<?php $a;");
        let err = list.inner_tokens(find(&list, "$a")).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_is_declaration_of() {
        let list = build("<?php final class Foo {}");
        let first = find(&list, "final");
        assert!(list.is_declaration_of(first, TokenKind::Class));
        assert!(!list.is_declaration_of(first, TokenKind::Interface));
        assert!(list.is_declaration_of(find(&list, "Foo"), TokenKind::Class));

        let list = build("<?php $x = new Foo;");
        let first = find(&list, "$x");
        assert!(!list.is_declaration_of(first, TokenKind::Class));
    }

    #[test]
    fn test_is_declaration_of_namespace_block() {
        let list = build("<?php namespace App\\Models { class A extends B implements C, D {} }");
        let ns_name = find(&list, "App\\Models");
        assert!(list.is_declaration_of(ns_name, TokenKind::Namespace));

        let d = find(&list, "D");
        assert!(list.is_declaration_of(d, TokenKind::Class));
        assert!(!list.is_declaration_of(d, TokenKind::Namespace));
    }
}
