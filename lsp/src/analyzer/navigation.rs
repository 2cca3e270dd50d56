//! Definition, reference and highlight queries.

use std::sync::Arc;

use lls_syntax::{GotoLabel, NodeKind, NodeRef, Position, TextRange, Variable};
use url::Url;

use crate::analyzer::{locate, position};
use crate::error::Result;
use crate::workspace::{Workspace, WorkspaceFile};

/// A node pinned to the file it lives in. The range comes from the node's
/// own tree, the uri from the workspace.
#[derive(Debug, Clone)]
pub(crate) struct Site {
    pub(crate) uri: Url,
    pub(crate) node: NodeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HighlightKind {
    Read,
    Write,
    Text,
}

enum Target {
    Variable(Arc<Variable>),
    Label(Arc<GotoLabel>),
}

/// Declaration sites for the symbol at `pos`. Variables without a
/// declaration statement fall back to every assignment naming them.
pub(crate) fn definition(
    workspace: &Workspace,
    file: &WorkspaceFile,
    pos: Position,
) -> Result<Vec<Site>> {
    let Some(target) = target_at(file, pos)? else {
        return Ok(Vec::new());
    };
    let nodes = match target {
        Target::Variable(var) => match &var.declaration {
            Some(decl) => vec![decl.clone()],
            None => var
                .writes
                .iter()
                .filter_map(|write| var.assignee_node_in(write))
                .collect(),
        },
        Target::Label(label) => label.declaration.iter().cloned().collect(),
    };
    Ok(sites(workspace, file, nodes))
}

/// Every reference to the symbol at `pos`, declaration included. Globals
/// span files; nodes whose file cannot be resolved are skipped.
pub(crate) fn references(
    workspace: &Workspace,
    file: &WorkspaceFile,
    pos: Position,
) -> Result<Vec<Site>> {
    let Some(target) = target_at(file, pos)? else {
        return Ok(Vec::new());
    };
    let nodes = match target {
        Target::Variable(var) => {
            let mut nodes: Vec<NodeRef> = var.declaration.iter().cloned().collect();
            nodes.extend(var.reads.iter().cloned());
            nodes.extend(
                var.writes
                    .iter()
                    .filter_map(|write| var.assignee_node_in(write)),
            );
            nodes
        }
        Target::Label(label) => {
            let mut nodes: Vec<NodeRef> = label.declaration.iter().cloned().collect();
            nodes.extend(label.jumps.iter().cloned());
            nodes
        }
    };
    Ok(sites(workspace, file, nodes))
}

/// Occurrences of the symbol at `pos` within the same file, tagged read or
/// write. For a keyword, the matching keywords of its statement light up.
pub(crate) fn document_highlight(
    file: &WorkspaceFile,
    pos: Position,
) -> Result<Vec<(TextRange, HighlightKind)>> {
    let resolved = position::resolve(file, pos)?;
    let tree = &file.tree;

    if tree.token_kind(resolved.token).is_keyword() {
        let Some(stmt) = tree
            .ancestors(resolved.parent.id)
            .find(|&n| tree.kind(n).is_statement())
        else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        collect_statement_keywords(tree, stmt, &mut out);
        out.sort_by_key(|(range, _)| range.start);
        return Ok(out);
    }

    let Some(target) = target_at(file, pos)? else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    match target {
        Target::Variable(var) => {
            for read in &var.reads {
                if Arc::ptr_eq(&read.tree, tree) {
                    out.push((read.range(), HighlightKind::Read));
                }
            }
            let mut writes: Vec<NodeRef> = var.declaration.iter().cloned().collect();
            writes.extend(
                var.writes
                    .iter()
                    .filter_map(|write| var.assignee_node_in(write)),
            );
            for write in writes {
                if Arc::ptr_eq(&write.tree, tree) {
                    out.push((write.range(), HighlightKind::Write));
                }
            }
        }
        Target::Label(label) => {
            for node in label.declaration.iter().chain(label.jumps.iter()) {
                if Arc::ptr_eq(&node.tree, tree) {
                    out.push((node.range(), HighlightKind::Text));
                }
            }
        }
    }
    out.sort_by_key(|(range, _)| range.start);
    out.dedup();
    Ok(out)
}

/// Keywords of one statement, clause keywords included, without descending
/// into the nested statements of its blocks.
fn collect_statement_keywords(
    tree: &Arc<lls_syntax::SyntaxTree>,
    stmt: lls_syntax::NodeId,
    out: &mut Vec<(TextRange, HighlightKind)>,
) {
    for token in tree.child_tokens(stmt) {
        if tree.token_kind(token).is_keyword() {
            out.push((tree.token_range(token), HighlightKind::Text));
        }
    }
    for child in tree.child_nodes(stmt) {
        if matches!(
            tree.kind(child),
            NodeKind::ElseifClause | NodeKind::ElseClause | NodeKind::FunctionBody
        ) {
            collect_statement_keywords(tree, child, out);
        }
    }
}

/// The variable or label the cursor sits on, if any.
fn target_at(file: &WorkspaceFile, pos: Position) -> Result<Option<Target>> {
    let resolved = position::resolve(file, pos)?;
    let tree = &file.tree;
    for node in tree.ancestors(resolved.parent.id) {
        let node = NodeRef::new(tree.clone(), node);
        if let Some(var) = file.program.variable_at(&node) {
            return Ok(Some(Target::Variable(var)));
        }
        match node.kind() {
            NodeKind::LabelStmt | NodeKind::GotoStmt => {
                if let Some(label) = file.program.label_at(&node) {
                    return Ok(Some(Target::Label(label)));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

fn sites(workspace: &Workspace, origin: &WorkspaceFile, nodes: Vec<NodeRef>) -> Vec<Site> {
    let mut out = Vec::new();
    for node in nodes {
        if let Some((file, _)) = locate::locate(workspace, origin, &node) {
            out.push(Site {
                uri: file.uri,
                node,
            });
        }
    }
    out.sort_by(|a, b| {
        (a.uri.as_str(), a.node.range().start).cmp(&(b.uri.as_str(), b.node.range().start))
    });
    out
}
