//! Namespace, type and function enumeration

use super::{advance, MemberKind, TokenExtractor};
use crate::error::{Error, Result};
use crate::token::{KindSet, TokenKind};
use compact_str::CompactString;
use tracing::debug;

const NAMESPACE: KindSet = KindSet::of(&[TokenKind::Namespace]);

const TYPE_KEYWORDS: KindSet = KindSet::of(&[
    TokenKind::Class,
    TokenKind::Interface,
    TokenKind::Trait,
    TokenKind::Enum,
]);

const FUNCTION: KindSet = KindSet::of(&[TokenKind::Function]);

/// Modifiers allowed between `new` and an anonymous `class`
const CLASS_MODIFIERS: KindSet =
    KindSet::of(&[TokenKind::Readonly, TokenKind::Final, TokenKind::Abstract]);

/// Iterator items yielded by every scope enumerator
pub type Scoped = Result<(CompactString, TokenExtractor)>;

// =============================================================================
// NAMESPACES
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Cursor {
    Start,
    At(usize),
}

/// Lazy `(name, view)` sequence of the namespaces in a view.
///
/// Code ahead of the first `namespace` keyword is yielded under `""`. A view
/// with no keyword at all is yielded whole under `""`.
#[derive(Debug)]
pub struct Namespaces {
    view: TokenExtractor,
    cursor: Cursor,
    done: bool,
}

impl Namespaces {
    pub(super) fn new(view: TokenExtractor) -> Self {
        Self {
            view,
            cursor: Cursor::Start,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<(CompactString, TokenExtractor)>> {
        let view = &self.view;
        let range = view.range();

        let keyword = match self.cursor {
            Cursor::At(keyword) => keyword,
            Cursor::Start => {
                let first = view.sibling_from(range.start, NAMESPACE);
                let preamble = range.start..first.unwrap_or(range.end);
                let Some(first) = first else {
                    self.done = true;
                    let scope = view.scope().apply_namespace("")?;
                    return Ok(Some((CompactString::default(), view.range_child(preamble, scope))));
                };
                self.cursor = Cursor::At(first);
                if view.has_code(preamble.clone()) {
                    let scope = view.scope().apply_namespace("")?;
                    return Ok(Some((CompactString::default(), view.range_child(preamble, scope))));
                }
                first
            }
        };

        let line = view.tok(keyword).line;
        let name_at = view
            .next_code(keyword)
            .filter(|&i| {
                matches!(
                    view.tok(i).kind,
                    TokenKind::String | TokenKind::NameQualified
                )
            })
            .ok_or_else(|| Error::structural(line, "expected a name after 'namespace'"))?;
        let name = view.tok(name_at).text.clone();
        let scope = view.scope().apply_namespace(&name)?;

        let after = view.next_code_or_terminator(name_at).ok_or_else(|| {
            Error::structural(line, format!("namespace {} is not followed by a body", name))
        })?;
        let after_token = view.tok(after);

        let child = if after_token.kind == TokenKind::OpenBrace {
            let close = view.closer_of(after)?;
            let child = view.block_child(after, scope)?;
            match view.sibling_from(close + 1, NAMESPACE) {
                Some(next) => self.cursor = Cursor::At(next),
                None => self.done = true,
            }
            child
        } else if view.taxonomy().terminators.contains(after_token.kind) {
            let start = after + 1;
            let next = view.sibling_from(start, NAMESPACE);
            match next {
                Some(next) => self.cursor = Cursor::At(next),
                None => self.done = true,
            }
            view.range_child(start..next.unwrap_or(range.end), scope)
        } else {
            return Err(Error::structural(
                after_token.line,
                format!(
                    "expected '{{', ';' or '?>' after namespace {}, found '{}'",
                    name, after_token.text
                ),
            ));
        };

        debug!(namespace = %name, line = line, "entered namespace");
        Ok(Some((name, child)))
    }
}

impl Iterator for Namespaces {
    type Item = Scoped;

    fn next(&mut self) -> Option<Scoped> {
        if self.done {
            return None;
        }
        let step = self.step();
        advance(&mut self.done, step)
    }
}

// =============================================================================
// TYPE DECLARATIONS
// =============================================================================

/// Lazy `(name, body view)` sequence of class-like declarations
#[derive(Debug)]
pub struct Classes {
    view: TokenExtractor,
    pos: usize,
    done: bool,
}

impl Classes {
    pub(super) fn new(view: TokenExtractor) -> Self {
        let pos = view.range().start;
        Self {
            view,
            pos,
            done: false,
        }
    }

    /// `new class`, `new readonly class` and `Foo::class`
    fn is_expression(view: &TokenExtractor, keyword: usize) -> bool {
        let mut prev = view.prev_code(keyword);
        if view.is_kind(prev, TokenKind::DoubleColon) {
            return true;
        }
        while let Some(p) = prev.filter(|&p| CLASS_MODIFIERS.contains(view.tok(p).kind)) {
            prev = view.prev_code(p);
        }
        view.is_kind(prev, TokenKind::New)
    }

    fn step(&mut self) -> Result<Option<(CompactString, TokenExtractor)>> {
        let view = &self.view;
        let body_or_end = view.taxonomy().terminators.with(TokenKind::OpenBrace);

        while let Some(keyword) = view.sibling_from(self.pos, TYPE_KEYWORDS) {
            self.pos = keyword + 1;
            if Self::is_expression(view, keyword) {
                continue;
            }

            let kw = view.tok(keyword);
            let name_at = view
                .next_code(keyword)
                .filter(|&i| view.tok(i).kind == TokenKind::String)
                .ok_or_else(|| {
                    Error::structural(kw.line, format!("expected a name after '{}'", kw.text))
                })?;
            let name = view.tok(name_at).text.clone();

            let open = view
                .next_sibling_of(name_at, body_or_end)
                .filter(|&i| view.tok(i).kind == TokenKind::OpenBrace)
                .ok_or_else(|| {
                    Error::structural(kw.line, format!("{} {} has no body", kw.text, name))
                })?;

            let scope = view.scope().apply_type(&name, view.token_ref(open))?;
            let child = view.block_child(open, scope)?;
            self.pos = view.closer_of(open)? + 1;

            debug!(kind = %kw.kind, name = %name, line = kw.line, "found type declaration");
            return Ok(Some((name, child)));
        }

        Ok(None)
    }
}

impl Iterator for Classes {
    type Item = Scoped;

    fn next(&mut self) -> Option<Scoped> {
        if self.done {
            return None;
        }
        let step = self.step();
        advance(&mut self.done, step)
    }
}

// =============================================================================
// FUNCTIONS
// =============================================================================

/// Lazy `(name, body view)` sequence of named function declarations.
///
/// Declarations without a body (`abstract function f();`) yield an empty
/// view positioned at their terminator.
#[derive(Debug)]
pub struct Functions {
    view: TokenExtractor,
    pos: usize,
    done: bool,
}

impl Functions {
    pub(super) fn new(view: TokenExtractor) -> Self {
        let pos = view.range().start;
        Self {
            view,
            pos,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<(CompactString, TokenExtractor)>> {
        let view = &self.view;
        let body_or_end = view.taxonomy().terminators.with(TokenKind::OpenBrace);

        while let Some(keyword) = view.sibling_from(self.pos, FUNCTION) {
            self.pos = keyword + 1;
            if view.is_kind(view.prev_code(keyword), TokenKind::Use) {
                continue;
            }

            let mut name_at = view.next_code(keyword);
            if view.is_kind(name_at, TokenKind::Ampersand) {
                name_at = name_at.and_then(|i| view.next_code(i));
            }
            // closures have no name
            let Some(name_at) = name_at.filter(|&i| view.tok(i).kind == TokenKind::String) else {
                continue;
            };
            let name = view.tok(name_at).text.clone();
            let line = view.tok(keyword).line;

            let end = view.next_sibling_of(name_at, body_or_end).ok_or_else(|| {
                Error::structural(line, format!("function {} has no body", name))
            })?;
            let scope = view
                .scope()
                .apply_member(MemberKind::Function, &name, view.token_ref(name_at))?;

            let child = if view.tok(end).kind == TokenKind::OpenBrace {
                self.pos = view.closer_of(end)? + 1;
                view.block_child(end, scope)?
            } else {
                self.pos = end + 1;
                view.range_child(end..end, scope)
            };

            debug!(function = %name, line = line, "found function");
            return Ok(Some((name, child)));
        }

        Ok(None)
    }
}

impl Iterator for Functions {
    type Item = Scoped;

    fn next(&mut self) -> Option<Scoped> {
        if self.done {
            return None;
        }
        let step = self.step();
        advance(&mut self.done, step)
    }
}
