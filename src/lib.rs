//! phpnav - PHP token navigation
//!
//! Lexes PHP into a linked token graph (code-only neighbours, bracket
//! pairs, nesting) and decomposes it into namespace, type and member views
//! that hand out verbatim token ranges and resolve names against imports.
//! No grammar, no AST.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod lex;
pub mod outline;
pub mod output;
pub mod token;
pub mod walker;

pub use config::Config;
pub use error::{Error, LexError, Result};
pub use extract::{Import, ImportKind, MemberKind, TokenExtractor};
pub use graph::TokenGraphBuilder;
pub use token::{KindSet, LexFlags, Taxonomy, Token, TokenKind, TokenList};
