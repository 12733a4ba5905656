//! Property and constant enumeration

use super::{advance, is_identifier, MemberKind, TokenExtractor};
use crate::error::{Error, Result};
use crate::token::{KindSet, TokenKind};
use compact_str::CompactString;
use tracing::debug;

const VARIABLE: KindSet = KindSet::of(&[TokenKind::Variable]);
const CONST: KindSet = KindSet::of(&[TokenKind::Const]);

// =============================================================================
// PROPERTIES
// =============================================================================

/// Lazy `(name, default value view)` sequence of the properties of a type
/// body. Names come without the leading `$`.
///
/// A property without an initializer yields an empty view, the same as an
/// empty value expression.
#[derive(Debug)]
pub struct Properties {
    view: TokenExtractor,
    pos: usize,
    done: bool,
}

impl Properties {
    pub(super) fn new(view: TokenExtractor) -> Result<Self> {
        let is_type_body = match (&view.0.scope.type_decl, &view.0.anchor) {
            (Some(type_decl), Some(anchor)) => type_decl.open == *anchor,
            _ => false,
        };
        if !is_type_body {
            return Err(Error::usage(
                "properties can only be listed on a type body",
            ));
        }

        let pos = view.range().start;
        Ok(Self {
            view,
            pos,
            done: false,
        })
    }

    fn step(&mut self) -> Result<Option<(CompactString, TokenExtractor)>> {
        let view = &self.view;
        let Some(var) = view.sibling_from(self.pos, VARIABLE) else {
            return Ok(None);
        };

        let token = view.tok(var);
        let name = CompactString::from(token.text.trim_start_matches('$'));
        let scope = view
            .scope()
            .apply_member(MemberKind::Property, &name, view.token_ref(var))?;

        let equals = view
            .next_code(var)
            .filter(|&i| view.tok(i).kind == TokenKind::Equals);
        let child = match equals {
            Some(eq) => {
                let list_end = view.taxonomy().terminators.with(TokenKind::Comma);
                let stop = view
                    .next_sibling_of(eq, list_end)
                    .unwrap_or(view.range().end);
                self.pos = stop;
                view.range_child(view.value_range(eq, stop), scope)
            }
            None => {
                self.pos = var + 1;
                view.range_child(var + 1..var + 1, scope)
            }
        };

        debug!(property = %name, line = token.line, "found property");
        Ok(Some((name, child)))
    }
}

impl Iterator for Properties {
    type Item = Result<(CompactString, TokenExtractor)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let step = self.step();
        advance(&mut self.done, step)
    }
}

// =============================================================================
// CONSTANTS
// =============================================================================

/// Lazy `(name, value view)` sequence of `const` declarations, one item per
/// name in a comma-separated list. `use const` imports are skipped.
#[derive(Debug)]
pub struct Constants {
    view: TokenExtractor,
    pos: usize,
    /// Comma that continues the current declaration
    pending: Option<usize>,
    done: bool,
}

impl Constants {
    pub(super) fn new(view: TokenExtractor) -> Self {
        let pos = view.range().start;
        Self {
            view,
            pos,
            pending: None,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<(CompactString, TokenExtractor)>> {
        let view = &self.view;

        let start = match self.pending.take() {
            Some(comma) => comma,
            None => loop {
                let Some(keyword) = view.sibling_from(self.pos, CONST) else {
                    return Ok(None);
                };
                self.pos = keyword + 1;
                if !view.is_kind(view.prev_code(keyword), TokenKind::Use) {
                    break keyword;
                }
            },
        };
        let line = view.tok(start).line;

        let terminators = view.taxonomy().terminators;
        let eq = view
            .next_sibling_of(start, terminators.with(TokenKind::Comma).with(TokenKind::Equals))
            .filter(|&i| view.tok(i).kind == TokenKind::Equals)
            .ok_or_else(|| Error::structural(line, "constant declared without '='"))?;
        let name_at = view
            .prev_code(eq)
            .filter(|&i| i > start && is_identifier(view.tok(i)))
            .ok_or_else(|| Error::structural(line, "expected a constant name before '='"))?;
        let name = view.tok(name_at).text.clone();

        let end = view.next_sibling_of(eq, terminators.with(TokenKind::Comma));
        let stop = end.unwrap_or(view.range().end);
        self.pos = stop;
        if view.is_kind(end, TokenKind::Comma) {
            self.pending = end;
        }

        let scope = view
            .scope()
            .apply_member(MemberKind::Constant, &name, view.token_ref(name_at))?;
        debug!(constant = %name, line = line, "found constant");
        Ok(Some((name, view.range_child(view.value_range(eq, stop), scope))))
    }
}

impl Iterator for Constants {
    type Item = Result<(CompactString, TokenExtractor)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let step = self.step();
        advance(&mut self.done, step)
    }
}
