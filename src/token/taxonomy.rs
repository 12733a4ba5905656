//! Kind membership tables injected into the graph builder and extractor

use super::kind::{KindSet, TokenKind};

/// The lexical taxonomy the navigation layer works against.
///
/// Every set is explicit so the builder and extractor never hard-code which
/// kinds open brackets, which are trivia, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Taxonomy {
    /// Kinds that open a bracket pair
    pub openers: KindSet,
    /// Kinds that close a bracket pair
    pub closers: KindSet,
    /// Kinds skipped by `prev_code`/`next_code`
    pub trivia: KindSet,
    /// Kinds allowed inside a declaration header (modifiers, names, keywords)
    pub declaration_parts: KindSet,
    /// Kinds that make up a qualified name
    pub name_segments: KindSet,
    /// Kinds that end a statement
    pub terminators: KindSet,
}

impl Taxonomy {
    pub const PHP: Taxonomy = Taxonomy {
        openers: KindSet::of(&[
            TokenKind::OpenBrace,
            TokenKind::OpenBracket,
            TokenKind::OpenParen,
            TokenKind::Attribute,
        ]),
        closers: KindSet::of(&[
            TokenKind::CloseBrace,
            TokenKind::CloseBracket,
            TokenKind::CloseParen,
        ]),
        trivia: KindSet::of(&[
            TokenKind::InlineHtml,
            TokenKind::OpenTag,
            TokenKind::OpenTagWithEcho,
            TokenKind::CloseTag,
            TokenKind::Whitespace,
            TokenKind::Comment,
            TokenKind::DocComment,
        ]),
        declaration_parts: KindSet::of(&[
            TokenKind::Abstract,
            TokenKind::Final,
            TokenKind::Readonly,
            TokenKind::Public,
            TokenKind::Protected,
            TokenKind::Private,
            TokenKind::Static,
            TokenKind::Var,
            TokenKind::String,
            TokenKind::NameQualified,
            TokenKind::NameFullyQualified,
            TokenKind::NameRelative,
            TokenKind::NsSeparator,
            TokenKind::Comma,
            TokenKind::Namespace,
            TokenKind::Class,
            TokenKind::Interface,
            TokenKind::Trait,
            TokenKind::Enum,
            TokenKind::Function,
            TokenKind::Const,
            TokenKind::Extends,
            TokenKind::Implements,
        ]),
        name_segments: KindSet::of(&[
            TokenKind::String,
            TokenKind::NameQualified,
            TokenKind::NameFullyQualified,
            TokenKind::NameRelative,
            TokenKind::NsSeparator,
        ]),
        terminators: KindSet::of(&[TokenKind::Semicolon, TokenKind::CloseTag]),
    };

    #[inline]
    pub fn is_trivia(&self, kind: TokenKind) -> bool {
        self.trivia.contains(kind)
    }

    #[inline]
    pub fn is_code(&self, kind: TokenKind) -> bool {
        !self.trivia.contains(kind)
    }

    #[inline]
    pub fn is_opener(&self, kind: TokenKind) -> bool {
        self.openers.contains(kind)
    }

    #[inline]
    pub fn is_closer(&self, kind: TokenKind) -> bool {
        self.closers.contains(kind)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::PHP
    }
}
