//! Resolves nodes back to the file they belong to.

use std::sync::Arc;

use lls_syntax::{NodeRef, TextRange};

use crate::workspace::{Workspace, WorkspaceFile};

/// The owning file and span of `node`. Nodes from the origin snapshot skip
/// the store lookup entirely. Returns `None` when the owning file is neither
/// tracked nor loadable; callers drop such references.
pub(crate) fn locate(
    workspace: &Workspace,
    origin: &WorkspaceFile,
    node: &NodeRef,
) -> Option<(WorkspaceFile, TextRange)> {
    if Arc::ptr_eq(&node.tree, &origin.tree) {
        return Some((origin.clone(), node.range()));
    }
    workspace.locate(node).map(|file| (file, node.range()))
}
