//! Byte-level scanner behind `tokenize`

use crate::error::LexError;
use crate::token::{Taxonomy, Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// COMPILED PATTERNS
// =============================================================================

/// Identifier, optionally qualified and/or fully qualified
static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\\?[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*(?:\\[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*)*")
        .unwrap()
});

static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*").unwrap()
});

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:0[xX][0-9a-fA-F]+(?:_[0-9a-fA-F]+)*|0[bB][01]+(?:_[01]+)*|0[oO][0-7]+(?:_[0-7]+)*|(?:[0-9]+(?:_[0-9]+)*)?\.[0-9]+(?:_[0-9]+)*(?:[eE][+-]?[0-9]+(?:_[0-9]+)*)?|[0-9]+(?:_[0-9]+)*(?:\.(?:[0-9]+(?:_[0-9]+)*)?)?(?:[eE][+-]?[0-9]+(?:_[0-9]+)*)?)",
    )
    .unwrap()
});

/// `<<<LABEL`, `<<<"LABEL"` or `<<<'LABEL'` followed by a newline
static HEREDOC_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^<<<[ \t]*(?:"([A-Za-z_][A-Za-z0-9_]*)"|'([A-Za-z_][A-Za-z0-9_]*)'|([A-Za-z_][A-Za-z0-9_]*))\r?\n"#)
        .unwrap()
});

/// Whitespace and comments then a word, used to tell `enum Foo` from a call
/// to `enum()`. A `#[` attribute is not a comment.
static ENUM_LOOKAHEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[ \t\r\n]+|/\*(?s:.*?)\*/|//[^\r\n]*|#(?:[^\[\r\n][^\r\n]*)?)*([A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*)",
    )
    .unwrap()
});

/// Multi-character operators, longest first
const OPERATORS: &[&str] = &[
    "**=", "...", "<=>", "===", "!==", "<<=", ">>=", "??=", "?->", "**", "++", "--", "->", "=>",
    "::", "==", "!=", "<>", "<=", ">=", "&&", "||", "??", "+=", "-=", "*=", "/=", ".=", "%=",
    "&=", "|=", "^=", "<<", ">>",
];

const RESERVED: &[&str] = &[
    "__halt_compiler", "and", "array", "break", "callable", "case", "catch", "clone", "continue",
    "declare", "default", "die", "do", "echo", "else", "elseif", "empty", "enddeclare", "endfor",
    "endforeach", "endif", "endswitch", "endwhile", "eval", "exit", "finally", "for", "foreach",
    "global", "goto", "if", "include", "include_once", "instanceof", "insteadof", "isset", "list",
    "match", "or", "print", "require", "require_once", "return", "switch", "throw", "try",
    "unset", "while", "xor", "yield",
];

// =============================================================================
// SCANNER
// =============================================================================

pub(super) struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    in_php: bool,
    tokens: Vec<Token>,
    /// Kinds of the two most recent code tokens, newest first
    recent: [Option<TokenKind>; 2],
}

impl<'a> Scanner<'a> {
    pub(super) fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            in_php: false,
            tokens: Vec::new(),
            recent: [None, None],
        }
    }

    pub(super) fn run(mut self) -> Result<Vec<Token>, LexError> {
        while self.pos < self.src.len() {
            if self.in_php {
                self.scan_php()?;
            } else {
                self.scan_html();
            }
        }
        Ok(self.tokens)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn push(&mut self, kind: TokenKind, len: usize) {
        let text = &self.src[self.pos..self.pos + len];
        self.tokens.push(Token::new(kind, text, self.pos, self.line));
        self.line += text.bytes().filter(|&b| b == b'\n').count() as u32;
        self.pos += len;
        if !Taxonomy::PHP.is_trivia(kind) {
            self.recent = [Some(kind), self.recent[0]];
        }
    }

    fn scan_html(&mut self) {
        let rest = self.rest();
        let mut search = 0;

        while let Some(found) = rest[search..].find("<?") {
            let at = search + found;
            let after = &rest[at + 2..];

            if after.starts_with('=') {
                if at > 0 {
                    self.push(TokenKind::InlineHtml, at);
                }
                self.push(TokenKind::OpenTagWithEcho, 3);
                self.in_php = true;
                return;
            }

            if after.get(..3).map_or(false, |s| s.eq_ignore_ascii_case("php")) {
                let tail = &after[3..];
                let trailing = if tail.starts_with("\r\n") {
                    Some(2)
                } else if tail.starts_with(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r')) {
                    Some(1)
                } else if tail.is_empty() {
                    Some(0)
                } else {
                    None
                };

                if let Some(trailing) = trailing {
                    if at > 0 {
                        self.push(TokenKind::InlineHtml, at);
                    }
                    self.push(TokenKind::OpenTag, 5 + trailing);
                    self.in_php = true;
                    return;
                }
            }

            search = at + 2;
        }

        self.push(TokenKind::InlineHtml, rest.len());
    }

    fn scan_php(&mut self) -> Result<(), LexError> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let c = bytes[0];

        if matches!(c, b' ' | b'\t' | b'\n' | b'\r') {
            let len = bytes
                .iter()
                .take_while(|&&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                .count();
            self.push(TokenKind::Whitespace, len);
        } else if rest.starts_with("?>") {
            let tail = &rest[2..];
            let len = if tail.starts_with("\r\n") {
                4
            } else if tail.starts_with('\n') {
                3
            } else {
                2
            };
            self.push(TokenKind::CloseTag, len);
            self.in_php = false;
        } else if rest.starts_with("#[") {
            self.push(TokenKind::Attribute, 2);
        } else if c == b'#' || rest.starts_with("//") {
            self.line_comment();
        } else if rest.starts_with("/*") {
            self.block_comment()?;
        } else if matches!(c, b'\'' | b'"' | b'`') {
            self.quoted(c)?;
        } else if rest.starts_with("<<<") && self.heredoc()? {
            // consumed
        } else if c == b'$' {
            let len = VARIABLE.find(rest).map_or(1, |m| m.end());
            let kind = if len > 1 {
                TokenKind::Variable
            } else {
                TokenKind::Operator
            };
            self.push(kind, len);
        } else if c.is_ascii_digit() || (c == b'.' && bytes.get(1).map_or(false, u8::is_ascii_digit)) {
            self.number();
        } else if c == b'\\' || c == b'_' || c.is_ascii_alphabetic() || c >= 0x80 {
            self.name();
        } else {
            self.punctuation()?;
        }

        Ok(())
    }

    /// `//` or `#` comment, ending before the newline or a close tag
    fn line_comment(&mut self) {
        let rest = self.rest();
        let end = [rest.find('\n'), rest.find('\r'), rest.find("?>")]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(rest.len());
        self.push(TokenKind::Comment, end);
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let rest = self.rest();
        let Some(end) = rest[2..].find("*/") else {
            return Err(LexError::UnterminatedComment { line: self.line });
        };
        let is_doc = rest.starts_with("/**")
            && rest
                .as_bytes()
                .get(3)
                .map_or(false, |b| b.is_ascii_whitespace());
        let kind = if is_doc {
            TokenKind::DocComment
        } else {
            TokenKind::Comment
        };
        self.push(kind, end + 4);
        Ok(())
    }

    fn quoted(&mut self, delimiter: u8) -> Result<(), LexError> {
        let bytes = self.rest().as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b if b == delimiter => {
                    self.push(TokenKind::ConstantEncapsedString, i + 1);
                    return Ok(());
                }
                _ => i += 1,
            }
        }
        Err(LexError::UnterminatedString { line: self.line })
    }

    /// Heredoc or nowdoc as start, body and end tokens.
    ///
    /// Returns `false` when `<<<` does not start a heredoc header.
    fn heredoc(&mut self) -> Result<bool, LexError> {
        let rest = self.rest();
        let Some(caps) = HEREDOC_START.captures(rest) else {
            return Ok(false);
        };
        let header_len = caps.get(0).map_or(0, |m| m.end());
        let label = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());

        let body = &rest[header_len..];
        let mut line_start = 0;
        loop {
            let line = &body[line_start..];
            let indent = line
                .bytes()
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            let candidate = &line[indent..];
            let closes = candidate.starts_with(label)
                && !candidate[label.len()..]
                    .chars()
                    .next()
                    .map_or(false, |c| c.is_alphanumeric() || c == '_');

            if closes {
                self.push(TokenKind::StartHeredoc, header_len);
                if line_start > 0 {
                    self.push(TokenKind::EncapsedAndWhitespace, line_start);
                }
                self.push(TokenKind::EndHeredoc, indent + label.len());
                return Ok(true);
            }

            match line.find('\n') {
                Some(newline) => line_start += newline + 1,
                None => break,
            }
        }

        Err(LexError::UnterminatedHeredoc {
            label: label.to_string(),
            line: self.line,
        })
    }

    fn number(&mut self) {
        let rest = self.rest();
        let text = NUMBER.find(rest).map_or(&rest[..1], |m| m.as_str());
        let prefixed = text.len() > 1
            && text.starts_with('0')
            && matches!(text.as_bytes()[1], b'x' | b'X' | b'b' | b'B' | b'o' | b'O');
        let kind = if !prefixed && text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
            TokenKind::DNumber
        } else {
            TokenKind::LNumber
        };
        self.push(kind, text.len());
    }

    fn name(&mut self) {
        let rest = self.rest();
        match NAME.find(rest) {
            Some(m) => {
                let kind = self.classify_name(m.as_str(), &rest[m.end()..]);
                self.push(kind, m.end());
            }
            None => self.push(TokenKind::NsSeparator, 1),
        }
    }

    fn classify_name(&self, text: &str, after: &str) -> TokenKind {
        if text.starts_with('\\') {
            return TokenKind::NameFullyQualified;
        }
        if text.contains('\\') {
            let relative = text
                .get(..10)
                .map_or(false, |p| p.eq_ignore_ascii_case("namespace\\"));
            return if relative {
                TokenKind::NameRelative
            } else {
                TokenKind::NameQualified
            };
        }

        let lower = text.to_ascii_lowercase();
        match self.recent {
            [Some(TokenKind::ObjectOperator), _] => return TokenKind::String,
            [Some(TokenKind::DoubleColon), _] if lower != "class" => return TokenKind::String,
            [Some(TokenKind::Function), _]
            | [Some(TokenKind::Const), _]
            | [Some(TokenKind::Ampersand), Some(TokenKind::Function)] => return TokenKind::String,
            _ => {}
        }

        match lower.as_str() {
            "abstract" => TokenKind::Abstract,
            "as" => TokenKind::As,
            "class" => TokenKind::Class,
            "const" => TokenKind::Const,
            "enum" => {
                let declares = ENUM_LOOKAHEAD.captures(after).map_or(false, |caps| {
                    let word = caps[1].to_ascii_lowercase();
                    word != "extends" && word != "implements"
                });
                if declares {
                    TokenKind::Enum
                } else {
                    TokenKind::String
                }
            }
            "extends" => TokenKind::Extends,
            "final" => TokenKind::Final,
            "fn" => TokenKind::Fn,
            "function" => TokenKind::Function,
            "implements" => TokenKind::Implements,
            "interface" => TokenKind::Interface,
            "namespace" => TokenKind::Namespace,
            "new" => TokenKind::New,
            "private" => TokenKind::Private,
            "protected" => TokenKind::Protected,
            "public" => TokenKind::Public,
            "readonly" => TokenKind::Readonly,
            "static" => TokenKind::Static,
            "trait" => TokenKind::Trait,
            "use" => TokenKind::Use,
            "var" => TokenKind::Var,
            word if RESERVED.contains(&word) => TokenKind::Keyword,
            _ => TokenKind::String,
        }
    }

    fn punctuation(&mut self) -> Result<(), LexError> {
        let rest = self.rest();

        if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            let kind = match *op {
                "->" | "?->" => TokenKind::ObjectOperator,
                "::" => TokenKind::DoubleColon,
                _ => TokenKind::Operator,
            };
            self.push(kind, op.len());
            return Ok(());
        }

        let ch = rest.chars().next().unwrap_or_default();
        let kind = match ch {
            '{' => TokenKind::OpenBrace,
            '}' => TokenKind::CloseBrace,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '=' => TokenKind::Equals,
            '&' => TokenKind::Ampersand,
            '+' | '-' | '*' | '/' | '%' | '.' | '!' | '<' | '>' | '|' | '^' | '~' | '@' | '?'
            | ':' => TokenKind::Operator,
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    ch,
                    line: self.line,
                })
            }
        };
        self.push(kind, ch.len_utf8());
        Ok(())
    }
}
