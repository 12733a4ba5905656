//! `use` statement parsing and the import table

use super::{advance, is_identifier, TokenExtractor};
use crate::error::{Error, Result};
use crate::token::TokenKind;
use compact_str::CompactString;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::Range;
use tracing::trace;

/// Which symbol table an import feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Class,
    Function,
    Constant,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Class => "class",
            Self::Function => "function",
            Self::Constant => "const",
        };
        write!(f, "{}", s)
    }
}

/// One imported name: `use {kind} {name} as {alias}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub alias: CompactString,
    pub kind: ImportKind,
    /// Fully qualified, without a leading separator
    pub name: String,
}

// =============================================================================
// IMPORT ITERATOR
// =============================================================================

/// Lazy sequence of namespace-level imports in source order
#[derive(Debug)]
pub struct Imports {
    view: TokenExtractor,
    pos: usize,
    pending: VecDeque<Import>,
    done: bool,
}

impl Imports {
    pub(super) fn new(view: TokenExtractor) -> Self {
        let pos = view.range().start;
        Self {
            view,
            pos,
            pending: VecDeque::new(),
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<Import>> {
        let view = &self.view;
        let end = view.range().end;

        while self.pending.is_empty() && self.pos < end {
            let i = self.pos;
            self.pos += 1;
            if view.tok(i).kind != TokenKind::Use || !is_import_statement(view, i) {
                continue;
            }

            let (code, terminator) = use_statement_at(view, i)?;
            self.pos = terminator + 1;
            parse_use_clause(view, &code, view.tok(i).line, &mut self.pending)?;
        }

        Ok(self.pending.pop_front())
    }
}

impl Iterator for Imports {
    type Item = Result<Import>;

    fn next(&mut self) -> Option<Result<Import>> {
        if self.done {
            return None;
        }
        let step = self.step();
        advance(&mut self.done, step)
    }
}

/// Namespace-level `use`, as opposed to a closure capture or a trait use
fn is_import_statement(view: &TokenExtractor, i: usize) -> bool {
    if view.is_kind(view.prev_code(i), TokenKind::CloseParen) {
        return false;
    }
    match view.tok(i).parent {
        None => view.scope().is_namespace_level(),
        Some(open) => view
            .tok(open)
            .prev_code
            .map_or(false, |p| view.token_list().is_declaration_of(p, TokenKind::Namespace)),
    }
}

/// Code tokens between `use` and its terminator
fn use_statement_at(view: &TokenExtractor, i: usize) -> Result<(SmallVec<[usize; 16]>, usize)> {
    let taxonomy = view.taxonomy();
    let mut code = SmallVec::new();
    for j in i + 1..view.range().end {
        let kind = view.tok(j).kind;
        if taxonomy.terminators.contains(kind) {
            return Ok((code, j));
        }
        if taxonomy.is_code(kind) {
            code.push(j);
        }
    }
    Err(Error::structural(
        view.tok(i).line,
        "use statement is never terminated",
    ))
}

/// Pending slice of a use clause: a list of items sharing a prefix
struct Frame {
    prefix: String,
    kind: ImportKind,
    items: Range<usize>,
}

/// Flatten one use clause into `out`, groups expanded in source order.
///
/// `code` holds arena indices of the clause's code tokens in ascending order.
fn parse_use_clause(
    view: &TokenExtractor,
    code: &[usize],
    line: u32,
    out: &mut VecDeque<Import>,
) -> Result<()> {
    let segments = view.taxonomy().name_segments;
    let tok = |n: usize| view.tok(code[n]);

    let (kind, first) = match code.first().map(|&i| view.tok(i).kind) {
        Some(TokenKind::Function) => (ImportKind::Function, 1),
        Some(TokenKind::Const) => (ImportKind::Constant, 1),
        _ => (ImportKind::Class, 0),
    };
    if first >= code.len() {
        return Err(Error::structural(line, "expected a name in use statement"));
    }
    let mut frames = vec![Frame {
        prefix: String::new(),
        kind,
        items: first..code.len(),
    }];

    'frames: while let Some(frame) = frames.pop() {
        let end = frame.items.end;
        let mut n = frame.items.start;

        while n < end {
            let kind = match tok(n).kind {
                TokenKind::Function => {
                    n += 1;
                    ImportKind::Function
                }
                TokenKind::Const => {
                    n += 1;
                    ImportKind::Constant
                }
                _ => frame.kind,
            };

            let mut name = frame.prefix.clone();
            let own_start = name.len();
            let name_start = n;
            // Segments must touch; `A B` is two names, not `AB`
            while n < end
                && segments.contains(tok(n).kind)
                && (n == name_start || code[n] == code[n - 1] + 1)
            {
                name.push_str(&tok(n).text);
                n += 1;
            }
            if name.len() == own_start {
                let found = code.get(n).map_or("end of statement", |_| tok(n).text.as_str());
                return Err(Error::structural(
                    line,
                    format!("expected a name in use statement, found '{}'", found),
                ));
            }

            if n < end && tok(n).kind == TokenKind::OpenBrace {
                let close = tok(n).closed_by.and_then(|c| code.binary_search(&c).ok());
                let Some(close) = close.filter(|&c| c < end) else {
                    return Err(Error::structural(line, "unclosed group in use statement"));
                };
                if close == n + 1 {
                    return Err(Error::structural(line, "empty group in use statement"));
                }

                let mut rest = close + 1;
                if rest < end {
                    if tok(rest).kind != TokenKind::Comma {
                        return Err(Error::structural(
                            line,
                            format!("unexpected '{}' after import group", tok(rest).text),
                        ));
                    }
                    rest += 1;
                }
                if rest < end {
                    frames.push(Frame {
                        prefix: frame.prefix.clone(),
                        kind: frame.kind,
                        items: rest..end,
                    });
                }
                frames.push(Frame {
                    prefix: name,
                    kind,
                    items: n + 1..close,
                });
                continue 'frames;
            }

            let alias = if n < end && tok(n).kind == TokenKind::As {
                let alias = (n + 1 < end)
                    .then(|| tok(n + 1))
                    .filter(|t| is_identifier(t))
                    .ok_or_else(|| Error::structural(line, "expected an alias after 'as'"))?;
                n += 2;
                alias.text.clone()
            } else {
                let last = name.rsplit('\\').next().unwrap_or_default();
                if last.is_empty() {
                    return Err(Error::structural(
                        line,
                        format!("import '{}' has no final segment", name),
                    ));
                }
                CompactString::from(last)
            };

            let name = match name.strip_prefix('\\') {
                Some(stripped) => stripped.to_string(),
                None => name,
            };
            trace!(alias = %alias, name = %name, kind = %kind, "import");
            out.push_back(Import { alias, kind, name });

            if n < end {
                if tok(n).kind != TokenKind::Comma {
                    return Err(Error::structural(
                        line,
                        format!("unexpected '{}' in use statement", tok(n).text),
                    ));
                }
                n += 1;
            }
        }
    }

    Ok(())
}

// =============================================================================
// IMPORT TABLE
// =============================================================================

/// Alias lookup for one namespace, keyed case-insensitively per kind
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    entries: HashMap<(ImportKind, String), String>,
}

impl ImportTable {
    pub fn from_imports(imports: impl IntoIterator<Item = Import>) -> Self {
        let entries = imports
            .into_iter()
            .map(|i| ((i.kind, i.alias.to_lowercase()), i.name))
            .collect();
        Self { entries }
    }

    pub fn get(&self, kind: ImportKind, alias: &str) -> Option<&str> {
        self.entries
            .get(&(kind, alias.to_lowercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(source: &str) -> Vec<Import> {
        let root = TokenExtractor::from_source(source).unwrap();
        let (_, ns) = root.namespaces().next().unwrap().unwrap();
        ns.imports().map(Result::unwrap).collect()
    }

    fn import(alias: &str, kind: ImportKind, name: &str) -> Import {
        Import {
            alias: alias.into(),
            kind,
            name: name.into(),
        }
    }

    #[test]
    fn test_group_import() {
        assert_eq!(
            imports("<?php use Ns\\{A, B as C, function f};"),
            vec![
                import("A", ImportKind::Class, "Ns\\A"),
                import("C", ImportKind::Class, "Ns\\B"),
                import("f", ImportKind::Function, "Ns\\f"),
            ]
        );
    }

    #[test]
    fn test_simple_imports() {
        let source = r#"<?php
namespace App;

use Vendor\Package\Client;
use \Other\Thing as Alias, Single;
use function Vendor\helpers\format_name;
use const Vendor\VERSION;
"#;
        assert_eq!(
            imports(source),
            vec![
                import("Client", ImportKind::Class, "Vendor\\Package\\Client"),
                import("Alias", ImportKind::Class, "Other\\Thing"),
                import("Single", ImportKind::Class, "Single"),
                import("format_name", ImportKind::Function, "Vendor\\helpers\\format_name"),
                import("VERSION", ImportKind::Constant, "Vendor\\VERSION"),
            ]
        );
    }

    #[test]
    fn test_group_order_and_kinds() {
        let source = "<?php use function Lib\\{a, b}, Lib\\c; use Root\\Sub\\{X, const Y, Deep\\Z,};";
        assert_eq!(
            imports(source),
            vec![
                import("a", ImportKind::Function, "Lib\\a"),
                import("b", ImportKind::Function, "Lib\\b"),
                import("c", ImportKind::Function, "Lib\\c"),
                import("X", ImportKind::Class, "Root\\Sub\\X"),
                import("Y", ImportKind::Constant, "Root\\Sub\\Y"),
                import("Z", ImportKind::Class, "Root\\Sub\\Deep\\Z"),
            ]
        );
    }

    #[test]
    fn test_closures_and_trait_uses_are_not_imports() {
        let source = r#"<?php
namespace App;
use Lib\Logger;
class Service {
    use LogsMessages, Caches;
    public function run() {
        return function () use ($x) { return $x; };
    }
}
"#;
        assert_eq!(
            imports(source),
            vec![import("Logger", ImportKind::Class, "Lib\\Logger")]
        );
    }

    #[test]
    fn test_brace_namespace_imports_from_root() {
        let source = "<?php namespace A { use X\\Y; class K { use T; } } namespace B { use Z; }";
        let root = TokenExtractor::from_source(source).unwrap();
        let all: Vec<Import> = root.imports().map(Result::unwrap).collect();
        assert_eq!(
            all,
            vec![
                import("Y", ImportKind::Class, "X\\Y"),
                import("Z", ImportKind::Class, "Z"),
            ]
        );

        let (_, b) = root.namespaces().nth(1).unwrap().unwrap();
        let only_b: Vec<Import> = b.imports().map(Result::unwrap).collect();
        assert_eq!(only_b, vec![import("Z", ImportKind::Class, "Z")]);
    }

    #[test]
    fn test_trait_use_in_class_view_is_skipped() {
        let root = TokenExtractor::from_source("<?php class K { use T; }").unwrap();
        let (_, body) = root.classes().next().unwrap().unwrap();
        assert_eq!(body.imports().count(), 0);
    }

    #[test]
    fn test_malformed_use_is_structural() {
        let root = TokenExtractor::from_source("<?php use Ns\\{A B};").unwrap();
        let mut iter = root.imports();
        assert!(iter.next().unwrap().unwrap_err().is_structural());
        assert!(iter.next().is_none());

        let root = TokenExtractor::from_source("<?php use A as;").unwrap();
        assert!(root.imports().next().unwrap().unwrap_err().is_structural());

        let root = TokenExtractor::from_source("<?php use A").unwrap();
        assert!(root.imports().next().unwrap().unwrap_err().is_structural());
    }

    #[test]
    fn test_separated_names_do_not_merge() {
        for source in ["<?php use A B;", "<?php use Ns\\{A B};", "<?php use A /* x */ B;"] {
            let root = TokenExtractor::from_source(source).unwrap();
            let first = root.imports().next().unwrap();
            assert!(first.unwrap_err().is_structural(), "{}", source);
        }
    }

    #[test]
    fn test_empty_use_is_structural() {
        for source in ["<?php use ;", "<?php use function;", "<?php use Ns\\{};"] {
            let root = TokenExtractor::from_source(source).unwrap();
            let mut iter = root.imports();
            assert!(iter.next().unwrap().unwrap_err().is_structural(), "{}", source);
            assert!(iter.next().is_none());
        }
    }

    #[test]
    fn test_import_table_lookup() {
        let table = ImportTable::from_imports(vec![
            import("Client", ImportKind::Class, "Http\\Client"),
            import("client", ImportKind::Function, "Http\\client"),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(ImportKind::Class, "CLIENT"), Some("Http\\Client"));
        assert_eq!(table.get(ImportKind::Function, "Client"), Some("Http\\client"));
        assert_eq!(table.get(ImportKind::Constant, "Client"), None);
    }
}
