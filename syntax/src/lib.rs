pub mod format;
pub mod kind;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod resolve;
pub mod source;
pub mod tree;

#[cfg(test)]
mod format_test;
#[cfg(test)]
mod parser_test;

pub use kind::{NodeKind, TokenKind, TriviaKind};
pub use program::{GotoLabel, NodeRef, Program, ProgramEntry, Scope, Variable};
pub use resolve::{Resolution, ScopeKind, VariableKind};
pub use source::{LineIndex, Position, TextRange};
pub use tree::{Diagnostic, NodeId, SyntaxTree, TokenId};

use std::sync::Arc;

/// Parses `text` into a syntax tree tagged with its source `path`.
///
/// Parsing is tolerant: malformed input still produces a tree covering the
/// whole text, with the problems reported through [`SyntaxTree::diagnostics`].
pub fn parse(text: &str, path: &str) -> Arc<SyntaxTree> {
    Arc::new(parser::parse(text, path))
}
