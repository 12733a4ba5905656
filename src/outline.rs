//! File outlines
//!
//! Walks a file's namespaces down to members and collects declaration names,
//! resolved parents and verbatim default values.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{Import, TokenExtractor};
use crate::graph::TokenGraphBuilder;
use crate::token::{LexFlags, Token, TokenKind};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct FileOutline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub namespaces: Vec<NamespaceOutline>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceOutline {
    /// Empty for the global namespace
    pub name: String,
    pub imports: Vec<Import>,
    pub constants: Vec<ValueOutline>,
    pub functions: Vec<FunctionOutline>,
    pub classes: Vec<ClassOutline>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassOutline {
    /// `class`, `interface`, `trait` or `enum`
    pub kind: String,
    pub name: String,
    pub qualified_name: String,
    pub line: u32,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub constants: Vec<ValueOutline>,
    pub properties: Vec<ValueOutline>,
    pub methods: Vec<FunctionOutline>,
}

/// A constant or property with its default value text
#[derive(Debug, Clone, Serialize)]
pub struct ValueOutline {
    pub name: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionOutline {
    pub name: String,
    pub line: u32,
    pub has_body: bool,
}

/// Outline a file on disk
pub fn outline_file(path: &Path, config: &Config) -> Result<FileOutline> {
    let bytes = std::fs::read(path)?;
    let tokens = builder(config).build_bytes(&bytes)?;
    let mut outline = outline_tokens(TokenExtractor::new(tokens)?, config)?;
    outline.path = Some(path.to_path_buf());
    Ok(outline)
}

/// Outline PHP source text. Bracket matching is always on.
pub fn outline_source(source: &str, config: &Config) -> Result<FileOutline> {
    let tokens = builder(config).build(source)?;
    outline_tokens(TokenExtractor::new(tokens)?, config)
}

fn builder(config: &Config) -> TokenGraphBuilder {
    TokenGraphBuilder::new(config.lexer.flags() | LexFlags::MATCH_BRACKETS)
}

fn outline_tokens(root: TokenExtractor, config: &Config) -> Result<FileOutline> {
    let include_values = config.outline.include_values;

    let mut namespaces = Vec::new();
    for entry in root.namespaces() {
        let (name, view) = entry?;
        namespaces.push(outline_namespace(&name, &view, include_values)?);
    }

    debug!(namespaces = namespaces.len(), "outlined source");
    Ok(FileOutline {
        path: None,
        namespaces,
    })
}

fn outline_namespace(name: &str, view: &TokenExtractor, include_values: bool) -> Result<NamespaceOutline> {
    let imports = view.imports().collect::<Result<Vec<_>>>()?;
    let constants = values(view.constants(), include_values)?;
    let functions = functions(view)?;

    let mut classes = Vec::new();
    for entry in view.classes() {
        let (class_name, body) = entry?;
        classes.push(outline_class(name, &class_name, view, &body, include_values)?);
    }

    Ok(NamespaceOutline {
        name: name.to_string(),
        imports,
        constants,
        functions,
        classes,
    })
}

fn outline_class(
    namespace: &str,
    name: &str,
    outer: &TokenExtractor,
    body: &TokenExtractor,
    include_values: bool,
) -> Result<ClassOutline> {
    let open = body
        .anchor()
        .ok_or_else(|| Error::usage(format!("type {} has no body anchor", name)))?;
    let header = declaration_header(outer, open);
    let keyword = header
        .first()
        .copied()
        .ok_or_else(|| Error::structural(open.line, format!("no declaration keyword for {}", name)))?;

    let mut extends = Vec::new();
    let mut implements = Vec::new();
    let mut target: Option<&mut Vec<String>> = None;
    for token in &header[1..] {
        match token.kind {
            TokenKind::Extends => target = Some(&mut extends),
            TokenKind::Implements => target = Some(&mut implements),
            TokenKind::String | TokenKind::NameQualified | TokenKind::NameFullyQualified | TokenKind::NameRelative => {
                if let Some(list) = target.as_deref_mut() {
                    list.push(outer.resolve_name(token)?);
                }
            }
            _ => {}
        }
    }

    let qualified_name = if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}\\{}", namespace, name)
    };

    Ok(ClassOutline {
        kind: keyword.text.to_ascii_lowercase(),
        name: name.to_string(),
        qualified_name,
        line: keyword.line,
        extends,
        implements,
        constants: values(body.constants(), include_values)?,
        properties: values(body.properties()?, include_values)?,
        methods: functions(body)?,
    })
}

/// Code tokens from the type keyword up to (not including) the body brace
fn declaration_header<'a>(view: &'a TokenExtractor, open: &'a Token) -> Vec<&'a Token> {
    let mut header = Vec::new();
    let mut cursor = view.prev_code_of(open);
    while let Some(token) = cursor {
        header.push(token);
        if matches!(
            token.kind,
            TokenKind::Class | TokenKind::Interface | TokenKind::Trait | TokenKind::Enum
        ) {
            break;
        }
        cursor = view.prev_code_of(token);
    }
    header.reverse();
    header
}

fn values<I>(iter: I, include_values: bool) -> Result<Vec<ValueOutline>>
where
    I: Iterator<Item = Result<(compact_str::CompactString, TokenExtractor)>>,
{
    iter.map(|entry| {
        let (name, view) = entry?;
        Ok(ValueOutline {
            name: name.to_string(),
            line: view.member_token().map_or(0, |t| t.line),
            value: include_values.then(|| view.code()),
        })
    })
    .collect()
}

fn functions(view: &TokenExtractor) -> Result<Vec<FunctionOutline>> {
    view.functions()
        .map(|entry| {
            let (name, body) = entry?;
            Ok(FunctionOutline {
                name: name.to_string(),
                line: body.member_token().map_or(0, |t| t.line),
                has_body: body.anchor().is_some(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LexError;
    use crate::extract::ImportKind;

    const SOURCE: &str = r#"<?php
declare(strict_types=1);

namespace App\Models;

use Illuminate\Database\Eloquent\Model;
use App\Contracts\{HasName, Exportable as CanExport};

const VERSION = '1.0';

function helper(): void {}

#[Table("users")]
final class User extends Model implements HasName, CanExport, \Stringable
{
    public const ROLE = 'member';

    protected $table = 'users';
    private ?string $nickname;

    abstract protected function label(): string;

    public function __toString(): string
    {
        return $this->nickname ?? '';
    }
}

enum Status: string implements HasName
{
    case Active = 'active';
}
"#;

    #[test]
    fn test_outline_source() {
        let outline = outline_source(SOURCE, &Config::default()).unwrap();
        let names: Vec<&str> = outline.namespaces.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["", "App\\Models"]);

        let ns = &outline.namespaces[1];
        assert_eq!(ns.imports.len(), 3);
        assert_eq!(ns.imports[2].alias, "CanExport");
        assert_eq!(ns.imports[2].kind, ImportKind::Class);
        assert_eq!(ns.constants[0].name, "VERSION");
        assert_eq!(ns.constants[0].value.as_deref(), Some("'1.0'"));
        assert_eq!(ns.functions[0].name, "helper");

        let user = &ns.classes[0];
        assert_eq!(user.kind, "class");
        assert_eq!(user.qualified_name, "App\\Models\\User");
        assert_eq!(user.line, 14);
        assert_eq!(user.extends, vec!["Illuminate\\Database\\Eloquent\\Model"]);
        assert_eq!(
            user.implements,
            vec![
                "App\\Contracts\\HasName",
                "App\\Contracts\\Exportable",
                "Stringable"
            ]
        );
        assert_eq!(user.constants[0].value.as_deref(), Some("'member'"));
        assert_eq!(user.properties.len(), 2);
        assert_eq!(user.properties[0].name, "table");
        assert_eq!(user.properties[1].value.as_deref(), Some(""));

        let methods: Vec<(&str, bool)> = user
            .methods
            .iter()
            .map(|m| (m.name.as_str(), m.has_body))
            .collect();
        assert_eq!(methods, vec![("label", false), ("__toString", true)]);

        let status = &ns.classes[1];
        assert_eq!(status.kind, "enum");
        assert!(status.extends.is_empty());
        assert_eq!(status.implements, vec!["App\\Contracts\\HasName"]);
    }

    #[test]
    fn test_outline_without_values() {
        let mut config = Config::default();
        config.outline.include_values = false;
        let outline = outline_source("<?php class A { const X = 1; }", &config).unwrap();
        let class = &outline.namespaces[0].classes[0];
        assert_eq!(class.qualified_name, "A");
        assert!(class.constants[0].value.is_none());

        let json = serde_json::to_value(&outline).unwrap();
        assert!(json["namespaces"][0]["classes"][0]["constants"][0]
            .get("value")
            .is_none());
        assert!(json.get("path").is_none());
    }

    #[test]
    fn test_outline_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.php");
        std::fs::write(&path, "<?php namespace A; interface I {}").unwrap();
        let outline = outline_file(&path, &Config::default()).unwrap();
        assert_eq!(outline.path.as_deref(), Some(path.as_path()));
        assert_eq!(outline.namespaces[0].classes[0].kind, "interface");

        std::fs::write(&path, b"<?php \xff").unwrap();
        assert!(matches!(
            outline_file(&path, &Config::default()),
            Err(Error::Lex(LexError::InvalidUtf8 { offset: 6 }))
        ));
    }

    #[test]
    fn test_outline_reports_structural_errors() {
        let err = outline_source("<?php namespace;", &Config::default()).unwrap_err();
        assert!(err.is_structural());
    }
}
