//! PHP Lexer
//!
//! Splits PHP source into the flat token list the graph builder links.
//! Every byte of the input ends up in exactly one token, so concatenating
//! token text reproduces the source.
//!
//! @module lex

mod scanner;

use crate::error::LexError;
use crate::token::Token;
use scanner::Scanner;

/// Tokenize UTF-8 source text
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Scanner::new(source).run()?;
    tracing::trace!(tokens = tokens.len(), bytes = source.len(), "tokenized source");
    Ok(tokens)
}

/// Tokenize raw bytes, rejecting invalid UTF-8
pub fn tokenize_bytes(bytes: &[u8]) -> Result<Vec<Token>, LexError> {
    let source = std::str::from_utf8(bytes).map_err(|e| LexError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;
    tokenize(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    const SAMPLE: &str = r#"<html>
<?php
declare(strict_types=1);

namespace App\Models;

use Foo\{Bar, Baz as Qux};
use function strlen;

#[Entity(table: "users")]
final class User extends Model implements \JsonSerializable
{
    /** @var string */
    public const TABLE = 'users';
    protected static ?array $cache = [1, 2.5, 0x1F, 1_000];
    private $name = "a \"quoted\" value";

    public function &list(int $x = 0): static
    {
        // line comment ?>
<?php
        # hash comment
        $text = <<<EOT
        Hello {$this->name}
        EOT;
        return $this?->name . namespace\helper($x) ?? self::class;
    }
}
?>
<p>done</p>
"#;

    #[test]
    fn test_round_trip() {
        let tokens = tokenize(SAMPLE).unwrap();
        let text: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(text, SAMPLE);

        let mut offset = 0;
        for t in &tokens {
            assert_eq!(t.offset, offset);
            offset = t.end_offset();
        }
    }

    #[test]
    fn test_open_and_close_tags() {
        let tokens = tokenize("<p><?php echo 1 ?>\n<b><?= $x ?>").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::InlineHtml);
        assert_eq!(tokens[0].text, "<p>");
        assert_eq!(tokens[1].kind, TokenKind::OpenTag);
        assert_eq!(tokens[1].text, "<?php ");

        let close = tokens.iter().find(|t| t.kind == TokenKind::CloseTag).unwrap();
        assert_eq!(close.text, "?>\n");

        let echo = tokens
            .iter()
            .find(|t| t.kind == TokenKind::OpenTagWithEcho)
            .unwrap();
        assert_eq!(echo.text, "<?=");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::CloseTag);
    }

    #[test]
    fn test_no_open_tag_is_inline_html() {
        let tokens = tokenize("just <?xml text").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::InlineHtml);
    }

    #[test]
    fn test_names() {
        let tokens = kinds("<?php Foo\\Bar \\Foo\\Bar namespace\\Foo Ns\\{A} Foo;");
        assert_eq!(tokens[1], (TokenKind::NameQualified, "Foo\\Bar".into()));
        assert_eq!(tokens[2], (TokenKind::NameFullyQualified, "\\Foo\\Bar".into()));
        assert_eq!(tokens[3], (TokenKind::NameRelative, "namespace\\Foo".into()));
        assert_eq!(tokens[4], (TokenKind::String, "Ns".into()));
        assert_eq!(tokens[5], (TokenKind::NsSeparator, "\\".into()));
        assert_eq!(tokens[6], (TokenKind::OpenBrace, "{".into()));
        assert_eq!(tokens[7], (TokenKind::String, "A".into()));
    }

    #[test]
    fn test_keyword_contexts() {
        let tokens = kinds("<?php $a->class; A::new(); A::class; function list() {} const FN = 1;");
        let texts: Vec<(TokenKind, &str)> = tokens.iter().map(|(k, t)| (*k, t.as_str())).collect();
        assert!(texts.contains(&(TokenKind::String, "class")));
        assert!(texts.contains(&(TokenKind::String, "new")));
        assert!(texts.contains(&(TokenKind::Class, "class")));
        assert!(texts.contains(&(TokenKind::String, "list")));
        assert!(texts.contains(&(TokenKind::String, "FN")));
        assert!(texts.contains(&(TokenKind::Function, "function")));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tokens = kinds("<?php NAMESPACE Foo; Use Bar; FINAL CLASS X {}");
        assert_eq!(tokens[1].0, TokenKind::Namespace);
        assert_eq!(tokens[4].0, TokenKind::Use);
        assert_eq!(tokens[7].0, TokenKind::Final);
        assert_eq!(tokens[8].0, TokenKind::Class);
    }

    #[test]
    fn test_enum_keyword_requires_name() {
        let tokens = kinds("<?php enum Suit: string {} enum(1); enum extends X");
        assert_eq!(tokens[1].0, TokenKind::Enum);
        let rest: Vec<TokenKind> = tokens.iter().skip(2).map(|(k, _)| *k).collect();
        assert!(!rest.contains(&TokenKind::Enum));
    }

    #[test]
    fn test_enum_keyword_looks_past_comments() {
        let source = "<?php enum /* c */ Suit {}\nenum // x\nColor {}\nenum # y\n Size {}\nenum /* c */ (1);";
        let enums: Vec<TokenKind> = kinds(source)
            .into_iter()
            .filter(|(_, text)| text == "enum")
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            enums,
            vec![TokenKind::Enum, TokenKind::Enum, TokenKind::Enum, TokenKind::String]
        );
    }

    #[test]
    fn test_operators_and_punctuation() {
        let tokens = kinds("<?php $a = $b == $c; $d &= &$e; $f?->g; A::B; fn() => 1;");
        let k: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(k[2], TokenKind::Equals);
        assert_eq!(tokens[4], (TokenKind::Operator, "==".into()));
        assert!(tokens.contains(&(TokenKind::Operator, "&=".into())));
        assert!(tokens.contains(&(TokenKind::Ampersand, "&".into())));
        assert!(tokens.contains(&(TokenKind::ObjectOperator, "?->".into())));
        assert!(tokens.contains(&(TokenKind::DoubleColon, "::".into())));
        assert!(tokens.contains(&(TokenKind::Fn, "fn".into())));
        assert!(tokens.contains(&(TokenKind::Operator, "=>".into())));
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("<?php /** doc */ /* block */ // line\n# hash\n#[Attr]").unwrap();
        let kinds: Vec<TokenKind> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::DocComment,
                TokenKind::Comment,
                TokenKind::Comment,
                TokenKind::Comment,
                TokenKind::Attribute,
                TokenKind::String,
                TokenKind::CloseBracket,
            ]
        );
        assert_eq!(tokens.iter().find(|t| t.text == "// line").unwrap().line, 1);
        assert_eq!(tokens.iter().find(|t| t.text == "# hash").unwrap().line, 2);
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("<?php 1 1.5 .5 1e3 0x1F 0b101 1_000;");
        let k: Vec<TokenKind> = tokens.iter().skip(1).take(7).map(|(k, _)| *k).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::LNumber,
                TokenKind::DNumber,
                TokenKind::DNumber,
                TokenKind::DNumber,
                TokenKind::LNumber,
                TokenKind::LNumber,
                TokenKind::LNumber,
            ]
        );
    }

    #[test]
    fn test_heredoc() {
        let source = "<?php $a = <<<'EOT'\n  body {$x}\n  EOT;\n";
        let tokens = kinds(source);
        assert_eq!(tokens[3], (TokenKind::StartHeredoc, "<<<'EOT'\n".into()));
        assert_eq!(
            tokens[4],
            (TokenKind::EncapsedAndWhitespace, "  body {$x}\n".into())
        );
        assert_eq!(tokens[5], (TokenKind::EndHeredoc, "  EOT".into()));
        assert_eq!(tokens[6].0, TokenKind::Semicolon);
    }

    #[test]
    fn test_unterminated_literals() {
        assert_eq!(
            tokenize("<?php\n$a = 'open;").unwrap_err(),
            LexError::UnterminatedString { line: 2 }
        );
        assert_eq!(
            tokenize("<?php /* never closed").unwrap_err(),
            LexError::UnterminatedComment { line: 1 }
        );
        assert!(matches!(
            tokenize("<?php $a = <<<EOT\nno end\n").unwrap_err(),
            LexError::UnterminatedHeredoc { .. }
        ));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            tokenize("<?php \u{1}").unwrap_err(),
            LexError::UnexpectedCharacter { ch: '\u{1}', line: 1 }
        ));
        assert_eq!(
            tokenize_bytes(b"<?php $a\xff").unwrap_err(),
            LexError::InvalidUtf8 { offset: 8 }
        );
    }
}
