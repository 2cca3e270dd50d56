//! Maps editor positions onto tokens and nodes of a snapshot's tree.

use lls_syntax::{NodeRef, Position, TokenId};

use crate::error::{AnalyzeError, Result};
use crate::workspace::WorkspaceFile;

/// The syntax surrounding one cursor position.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedPosition {
    pub(crate) token: TokenId,
    /// The node owning the token.
    pub(crate) parent: NodeRef,
    pub(crate) offset: usize,
}

/// Resolves `pos` to the token whose full span covers it. Fails when the
/// position lies outside the document or the token has no parent node.
pub(crate) fn resolve(file: &WorkspaceFile, pos: Position) -> Result<ResolvedPosition> {
    let tree = &file.tree;
    let offset = tree
        .line_index()
        .offset(tree.text(), pos)
        .ok_or(AnalyzeError::MalformedPosition {
            line: pos.line,
            character: pos.character,
        })?;
    let token = tree
        .token_at_offset(offset)
        .ok_or(AnalyzeError::OrphanToken { offset })?;
    let parent = tree
        .token_parent(token)
        .ok_or(AnalyzeError::OrphanToken { offset })?;
    Ok(ResolvedPosition {
        token,
        parent: NodeRef::new(tree.clone(), parent),
        offset,
    })
}
