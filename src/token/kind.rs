//! Token kinds and kind sets
//!
//! `TokenKind` is a closed, fieldless enum so that membership tables can be
//! expressed as bit sets (`KindSet`) and passed around by value.
//!
//! @module token/kind

use serde::{Deserialize, Serialize};

// =============================================================================
// TOKEN KIND
// =============================================================================

/// Classification of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TokenKind {
    // Markup and trivia
    InlineHtml,
    OpenTag,
    OpenTagWithEcho,
    CloseTag,
    Whitespace,
    Comment,
    DocComment,

    // Names
    /// Unqualified identifier
    String,
    /// `A\B`
    NameQualified,
    /// `\A\B`
    NameFullyQualified,
    /// `namespace\A`
    NameRelative,
    /// A `\` that does not start a name segment
    NsSeparator,
    Variable,

    // Literals
    LNumber,
    DNumber,
    ConstantEncapsedString,
    StartHeredoc,
    EncapsedAndWhitespace,
    EndHeredoc,

    // Declaration keywords
    Namespace,
    Use,
    As,
    Class,
    Interface,
    Trait,
    Enum,
    Function,
    Fn,
    Const,
    Extends,
    Implements,
    New,

    // Modifiers
    Abstract,
    Final,
    Readonly,
    Public,
    Protected,
    Private,
    Static,
    Var,

    /// Any other reserved word
    Keyword,

    // Brackets
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    /// `#[`
    Attribute,

    // Punctuation
    Semicolon,
    Comma,
    Equals,
    Ampersand,
    DoubleColon,
    /// `->` or `?->`
    ObjectOperator,
    Operator,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InlineHtml => "inline_html",
            Self::OpenTag => "open_tag",
            Self::OpenTagWithEcho => "open_tag_with_echo",
            Self::CloseTag => "close_tag",
            Self::Whitespace => "whitespace",
            Self::Comment => "comment",
            Self::DocComment => "doc_comment",
            Self::String => "string",
            Self::NameQualified => "name_qualified",
            Self::NameFullyQualified => "name_fully_qualified",
            Self::NameRelative => "name_relative",
            Self::NsSeparator => "ns_separator",
            Self::Variable => "variable",
            Self::LNumber => "lnumber",
            Self::DNumber => "dnumber",
            Self::ConstantEncapsedString => "constant_encapsed_string",
            Self::StartHeredoc => "start_heredoc",
            Self::EncapsedAndWhitespace => "encapsed_and_whitespace",
            Self::EndHeredoc => "end_heredoc",
            Self::Namespace => "namespace",
            Self::Use => "use",
            Self::As => "as",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Enum => "enum",
            Self::Function => "function",
            Self::Fn => "fn",
            Self::Const => "const",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::New => "new",
            Self::Abstract => "abstract",
            Self::Final => "final",
            Self::Readonly => "readonly",
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Static => "static",
            Self::Var => "var",
            Self::Keyword => "keyword",
            Self::OpenBrace => "open_brace",
            Self::CloseBrace => "close_brace",
            Self::OpenBracket => "open_bracket",
            Self::CloseBracket => "close_bracket",
            Self::OpenParen => "open_paren",
            Self::CloseParen => "close_paren",
            Self::Attribute => "attribute",
            Self::Semicolon => "semicolon",
            Self::Comma => "comma",
            Self::Equals => "equals",
            Self::Ampersand => "ampersand",
            Self::DoubleColon => "double_colon",
            Self::ObjectOperator => "object_operator",
            Self::Operator => "operator",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// KIND SET
// =============================================================================

/// A closed set of token kinds, one bit per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u128);

impl KindSet {
    pub const EMPTY: Self = Self(0);

    pub const fn of(kinds: &[TokenKind]) -> Self {
        let mut bits = 0u128;
        let mut i = 0;
        while i < kinds.len() {
            bits |= 1u128 << (kinds[i] as u8);
            i += 1;
        }
        Self(bits)
    }

    #[inline]
    pub const fn contains(self, kind: TokenKind) -> bool {
        self.0 & (1u128 << (kind as u8)) != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn with(self, kind: TokenKind) -> Self {
        Self(self.0 | (1u128 << (kind as u8)))
    }

    pub const fn without(self, kind: TokenKind) -> Self {
        Self(self.0 & !(1u128 << (kind as u8)))
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<TokenKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = TokenKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, KindSet::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_set_membership() {
        let set = KindSet::of(&[TokenKind::OpenBrace, TokenKind::Operator]);
        assert!(set.contains(TokenKind::OpenBrace));
        assert!(set.contains(TokenKind::Operator));
        assert!(!set.contains(TokenKind::CloseBrace));
        assert!(!set.contains(TokenKind::InlineHtml));
    }

    #[test]
    fn test_kind_set_combinators() {
        let set = KindSet::EMPTY.with(TokenKind::Comma).with(TokenKind::Semicolon);
        assert_eq!(set, KindSet::of(&[TokenKind::Semicolon, TokenKind::Comma]));
        assert!(!set.without(TokenKind::Comma).contains(TokenKind::Comma));
        assert!(KindSet::EMPTY.is_empty());

        let merged = KindSet::of(&[TokenKind::Class]).union(KindSet::of(&[TokenKind::Trait]));
        let collected: KindSet = [TokenKind::Trait, TokenKind::Class].into_iter().collect();
        assert_eq!(merged, collected);
    }
}
