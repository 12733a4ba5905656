//! Token Extractor
//!
//! A scoped view over a linked token list. Views decompose into namespace,
//! type and member views and resolve names against the imports visible at
//! namespace level.
//!
//! Range-derived views share their parent's arena. Block-derived views own a
//! detached copy of the bracket interior.
//!
//! @module extract

mod imports;
mod members;
mod scopes;

pub use imports::{Import, ImportKind, ImportTable, Imports};
pub use members::{Constants, Properties};
pub use scopes::{Classes, Functions, Namespaces};

use crate::error::{Error, Result};
use crate::graph::TokenGraphBuilder;
use crate::token::{KindSet, LexFlags, Taxonomy, Token, TokenKind, TokenList};
use compact_str::CompactString;
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use tracing::{debug, trace};

// =============================================================================
// SCOPE TAGS
// =============================================================================

/// What kind of member a member view was derived for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Function,
    Property,
    Constant,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Function => "function",
            Self::Property => "property",
            Self::Constant => "constant",
        };
        write!(f, "{}", s)
    }
}

/// A token pinned to the arena it lives in
#[derive(Clone)]
struct TokenRef {
    store: Rc<TokenList>,
    index: usize,
}

impl TokenRef {
    fn token(&self) -> &Token {
        &self.store[self.index]
    }
}

impl PartialEq for TokenRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store) && self.index == other.index
    }
}

impl fmt::Debug for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.token();
        write!(f, "#{} {:?} (line {})", self.index, t.text, t.line)
    }
}

#[derive(Debug, Clone)]
struct TypeTag {
    name: CompactString,
    open: TokenRef,
}

#[derive(Debug, Clone)]
struct MemberTag {
    kind: MemberKind,
    name: CompactString,
    declared_by: TokenRef,
}

/// Scope tags carried by a view. Each tag is applied at most once.
#[derive(Debug, Clone, Default)]
struct Scope {
    namespace: Option<CompactString>,
    type_decl: Option<TypeTag>,
    member: Option<MemberTag>,
}

impl Scope {
    fn apply_namespace(&self, name: &str) -> Result<Scope> {
        if let Some(current) = &self.namespace {
            return Err(Error::usage(format!(
                "namespace '{}' is already set, cannot enter '{}'",
                current, name
            )));
        }
        Ok(Scope {
            namespace: Some(name.into()),
            ..self.clone()
        })
    }

    fn apply_type(&self, name: &str, open: TokenRef) -> Result<Scope> {
        if let Some(current) = &self.type_decl {
            return Err(Error::usage(format!(
                "type '{}' is already set, cannot enter '{}'",
                current.name, name
            )));
        }
        Ok(Scope {
            type_decl: Some(TypeTag {
                name: name.into(),
                open,
            }),
            ..self.clone()
        })
    }

    fn apply_member(&self, kind: MemberKind, name: &str, declared_by: TokenRef) -> Result<Scope> {
        if let Some(current) = &self.member {
            return Err(Error::usage(format!(
                "{} '{}' is already set, cannot enter {} '{}'",
                current.kind, current.name, kind, name
            )));
        }
        Ok(Scope {
            member: Some(MemberTag {
                kind,
                name: name.into(),
                declared_by,
            }),
            ..self.clone()
        })
    }

    /// Imports live in views that are neither inside a type nor a member
    fn is_namespace_level(&self) -> bool {
        self.type_decl.is_none() && self.member.is_none()
    }
}

// =============================================================================
// EXTRACTOR
// =============================================================================

struct Inner {
    store: Rc<TokenList>,
    range: Range<usize>,
    parent: Option<TokenExtractor>,
    anchor: Option<TokenRef>,
    scope: Scope,
    imports: OnceCell<Rc<ImportTable>>,
}

/// An immutable view over a slice of a linked token arena.
///
/// Cloning is cheap: the view is a reference-counted handle. Deriving a child
/// (through `namespaces()`, `classes()` and friends) never changes `self`.
#[derive(Clone)]
pub struct TokenExtractor(Rc<Inner>);

impl TokenExtractor {
    /// Root view over a whole token list.
    ///
    /// The list must have been built with bracket matching and every opener
    /// must have a closer.
    pub fn new(list: TokenList) -> Result<Self> {
        if !list.flags().contains(LexFlags::MATCH_BRACKETS) {
            return Err(Error::usage(
                "extraction needs a token list built with MATCH_BRACKETS",
            ));
        }
        list.check_balanced()?;

        let range = 0..list.len();
        Ok(Self(Rc::new(Inner {
            store: Rc::new(list),
            range,
            parent: None,
            anchor: None,
            scope: Scope::default(),
            imports: OnceCell::new(),
        })))
    }

    /// Lex, link and wrap source with the default flags
    pub fn from_source(source: &str) -> Result<Self> {
        Self::from_source_with(source, LexFlags::default())
    }

    pub fn from_source_with(source: &str, flags: LexFlags) -> Result<Self> {
        Self::new(TokenGraphBuilder::new(flags).build(source)?)
    }

    fn block_child(&self, opener: usize, scope: Scope) -> Result<Self> {
        let inner = self.store().inner_tokens(opener)?;
        trace!(
            opener = opener,
            tokens = inner.len(),
            line = self.tok(opener).line,
            "derived block view"
        );

        let range = 0..inner.len();
        Ok(Self(Rc::new(Inner {
            store: Rc::new(inner),
            range,
            parent: Some(self.clone()),
            anchor: Some(self.token_ref(opener)),
            scope,
            imports: OnceCell::new(),
        })))
    }

    fn range_child(&self, range: Range<usize>, scope: Scope) -> Self {
        trace!(start = range.start, end = range.end, "derived range view");
        Self(Rc::new(Inner {
            store: Rc::clone(&self.0.store),
            range,
            parent: Some(self.clone()),
            anchor: None,
            scope,
            imports: OnceCell::new(),
        }))
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The whole arena this view indexes into
    pub fn token_list(&self) -> &TokenList {
        &self.0.store
    }

    /// Arena positions covered by this view
    pub fn range(&self) -> Range<usize> {
        self.0.range.clone()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.store().tokens()[self.range()]
    }

    pub fn is_empty(&self) -> bool {
        self.0.range.is_empty()
    }

    /// Verbatim text of the view, trivia included
    pub fn text(&self) -> String {
        self.tokens().iter().map(|t| t.text.as_str()).collect()
    }

    /// Text from the first to the last code token
    pub fn code(&self) -> String {
        let taxonomy = self.taxonomy();
        let tokens = self.tokens();
        let first = tokens.iter().position(|t| taxonomy.is_code(t.kind));
        let last = tokens.iter().rposition(|t| taxonomy.is_code(t.kind));
        match (first, last) {
            (Some(first), Some(last)) => tokens[first..=last]
                .iter()
                .map(|t| t.text.as_str())
                .collect(),
            _ => String::new(),
        }
    }

    pub fn parent(&self) -> Option<&TokenExtractor> {
        self.0.parent.as_ref()
    }

    /// The opening bracket (in the parent's arena) this view was cut from
    pub fn anchor(&self) -> Option<&Token> {
        self.0.anchor.as_ref().map(TokenRef::token)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.0.scope.namespace.as_deref()
    }

    pub fn type_name(&self) -> Option<&str> {
        self.0.scope.type_decl.as_ref().map(|t| t.name.as_str())
    }

    /// Opening brace of the enclosing type body
    pub fn type_token(&self) -> Option<&Token> {
        self.0.scope.type_decl.as_ref().map(|t| t.open.token())
    }

    pub fn member_kind(&self) -> Option<MemberKind> {
        self.0.scope.member.as_ref().map(|m| m.kind)
    }

    pub fn member_name(&self) -> Option<&str> {
        self.0.scope.member.as_ref().map(|m| m.name.as_str())
    }

    /// Token that declared the enclosing member
    pub fn member_token(&self) -> Option<&Token> {
        self.0.scope.member.as_ref().map(|m| m.declared_by.token())
    }

    /// Whether `token` is part of this view's own token list
    pub fn contains(&self, token: &Token) -> bool {
        self.position_of(token).is_some()
    }

    pub fn next_code_of(&self, token: &Token) -> Option<&Token> {
        let i = self.position_of(token)?;
        self.next_code(i).map(|j| self.tok(j))
    }

    pub fn prev_code_of(&self, token: &Token) -> Option<&Token> {
        let i = self.position_of(token)?;
        self.prev_code(i).map(|j| self.tok(j))
    }

    // -------------------------------------------------------------------------
    // Decomposition
    // -------------------------------------------------------------------------

    /// Namespaces declared at the top level of this view
    pub fn namespaces(&self) -> Namespaces {
        Namespaces::new(self.clone())
    }

    /// Class, interface, trait and enum declarations directly in this view
    pub fn classes(&self) -> Classes {
        Classes::new(self.clone())
    }

    /// Named function declarations directly in this view
    pub fn functions(&self) -> Functions {
        Functions::new(self.clone())
    }

    /// Property declarations of a type body
    pub fn properties(&self) -> Result<Properties> {
        Properties::new(self.clone())
    }

    /// `const` declarations directly in this view
    pub fn constants(&self) -> Constants {
        Constants::new(self.clone())
    }

    /// Namespace-level `use` imports anywhere in this view
    pub fn imports(&self) -> Imports {
        Imports::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Name resolution
    // -------------------------------------------------------------------------

    /// Import table of the nearest namespace-level view, built on first use
    pub fn import_table(&self) -> Result<Rc<ImportTable>> {
        let view = self.import_scope();
        view.0
            .imports
            .get_or_try_init(|| {
                let imports = view.imports().collect::<Result<Vec<_>>>()?;
                trace!(imports = imports.len(), "built import table");
                Ok::<_, Error>(Rc::new(ImportTable::from_imports(imports)))
            })
            .map(Rc::clone)
    }

    /// Fully qualified class name for the name starting at `token`
    pub fn resolve_name(&self, token: &Token) -> Result<String> {
        self.resolve_name_as(token, ImportKind::Class)
    }

    /// Fully qualified name, looking plain names up among `kind` imports
    pub fn resolve_name_as(&self, token: &Token, kind: ImportKind) -> Result<String> {
        let namespace = self
            .namespace()
            .ok_or_else(|| Error::usage("resolving a name needs a namespace scope"))?;
        let i = self.position_of(token).ok_or_else(|| {
            Error::usage(format!(
                "'{}' on line {} does not belong to this extractor",
                token.text, token.line
            ))
        })?;
        let name = self.name_at(i)?;

        let relative = name
            .get(..10)
            .filter(|p| p.eq_ignore_ascii_case("namespace\\"))
            .map(|_| &name[10..]);
        if let Some(rest) = relative {
            return Ok(qualify(namespace, rest));
        }
        if let Some(rest) = name.strip_prefix('\\') {
            return Ok(rest.to_string());
        }
        if name.contains('\\') {
            return Ok(name);
        }

        let table = self.import_table()?;
        Ok(match table.get(kind, &name) {
            Some(target) => target.to_string(),
            None => qualify(namespace, &name),
        })
    }

    fn import_scope(&self) -> &TokenExtractor {
        let mut view = self;
        while !view.0.scope.is_namespace_level() {
            match view.parent() {
                Some(parent) => view = parent,
                None => break,
            }
        }
        view
    }

    /// Contiguous run of name segments starting at `i`
    fn name_at(&self, i: usize) -> Result<String> {
        let segments = self.taxonomy().name_segments;
        let first = self.tok(i);
        if !segments.contains(first.kind) {
            return Err(Error::usage(format!(
                "'{}' on line {} is not a name",
                first.text, first.line
            )));
        }

        let mut name = String::new();
        let mut j = i;
        while j < self.0.range.end && segments.contains(self.tok(j).kind) {
            name.push_str(&self.tok(j).text);
            j += 1;
        }
        while name.len() > 1 && name.ends_with('\\') {
            name.pop();
        }
        Ok(name)
    }

    // -------------------------------------------------------------------------
    // Navigation inside the view
    // -------------------------------------------------------------------------

    fn store(&self) -> &TokenList {
        &self.0.store
    }

    fn scope(&self) -> &Scope {
        &self.0.scope
    }

    fn taxonomy(&self) -> &Taxonomy {
        self.store().taxonomy()
    }

    fn tok(&self, i: usize) -> &Token {
        &self.0.store[i]
    }

    fn token_ref(&self, i: usize) -> TokenRef {
        TokenRef {
            store: Rc::clone(&self.0.store),
            index: i,
        }
    }

    fn next_code(&self, i: usize) -> Option<usize> {
        self.tok(i).next_code.filter(|&j| j < self.0.range.end)
    }

    fn prev_code(&self, i: usize) -> Option<usize> {
        self.tok(i).prev_code.filter(|&j| j >= self.0.range.start)
    }

    fn is_kind(&self, i: Option<usize>, kind: TokenKind) -> bool {
        i.map_or(false, |i| self.tok(i).kind == kind)
    }

    /// Next token that is code or a statement terminator (`?>` is trivia)
    fn next_code_or_terminator(&self, i: usize) -> Option<usize> {
        let taxonomy = self.taxonomy();
        (i + 1..self.0.range.end).find(|&j| {
            let kind = self.tok(j).kind;
            taxonomy.is_code(kind) || taxonomy.terminators.contains(kind)
        })
    }

    /// First token at or after `start` whose kind is in `set`, at the nesting
    /// depth of `start`. Bracket pairs are skipped whole; an enclosing closer
    /// or the end of the view ends the search.
    fn sibling_from(&self, start: usize, set: KindSet) -> Option<usize> {
        let taxonomy = self.taxonomy();
        let mut i = start;
        while i < self.0.range.end {
            let t = self.tok(i);
            if set.contains(t.kind) {
                return Some(i);
            }
            if taxonomy.is_opener(t.kind) {
                i = t.closed_by?;
            } else if taxonomy.is_closer(t.kind) {
                return None;
            }
            i += 1;
        }
        None
    }

    fn next_sibling_of(&self, i: usize, set: KindSet) -> Option<usize> {
        self.sibling_from(i + 1, set)
    }

    fn has_code(&self, range: Range<usize>) -> bool {
        let taxonomy = self.taxonomy();
        range.into_iter().any(|i| taxonomy.is_code(self.tok(i).kind))
    }

    fn closer_of(&self, opener: usize) -> Result<usize> {
        let open = self.tok(opener);
        open.closed_by.ok_or_else(|| {
            Error::structural(open.line, format!("'{}' is never closed", open.text))
        })
    }

    /// Code tokens strictly between `after` and `stop`, or an empty range at
    /// `stop` when there are none
    fn value_range(&self, after: usize, stop: usize) -> Range<usize> {
        let taxonomy = self.taxonomy();
        let is_code = |i: &usize| taxonomy.is_code(self.tok(*i).kind);
        match (
            (after + 1..stop).find(is_code),
            (after + 1..stop).rev().find(is_code),
        ) {
            (Some(first), Some(last)) => first..last + 1,
            _ => stop..stop,
        }
    }

    fn position_of(&self, token: &Token) -> Option<usize> {
        let i = token.index;
        let owned = self
            .store()
            .get(i)
            .map_or(false, |t| std::ptr::eq(t, token));
        (owned && self.0.range.contains(&i)).then_some(i)
    }
}

impl fmt::Debug for TokenExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExtractor")
            .field("range", &self.0.range)
            .field("anchor", &self.0.anchor)
            .field("namespace", &self.0.scope.namespace)
            .field("type", &self.type_name())
            .field("member", &self.member_name())
            .finish()
    }
}

/// Turn one enumeration step into an iterator item. The first error ends
/// the sequence.
fn advance<T>(done: &mut bool, step: Result<Option<T>>) -> Option<Result<T>> {
    match step {
        Ok(Some(item)) => Some(Ok(item)),
        Ok(None) => {
            *done = true;
            None
        }
        Err(e) => {
            *done = true;
            debug!(error = %e, "enumeration stopped");
            Some(Err(e))
        }
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}\\{}", namespace, name)
    }
}

/// Identifier-shaped token, including reserved words used as names
fn is_identifier(token: &Token) -> bool {
    let mut chars = token.text.chars();
    chars
        .next()
        .map_or(false, |c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
