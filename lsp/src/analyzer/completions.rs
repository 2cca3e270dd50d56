//! Context-sensitive completion over the scope chain.

use lls_syntax::{NodeKind, NodeRef, Position, TokenKind};

use crate::analyzer::position;
use crate::analyzer::scope_walk::{self, WalkBound};
use crate::analyzer::CancelToken;
use crate::error::Result;
use crate::workspace::WorkspaceFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub(crate) name: String,
    pub(crate) kind: CandidateKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum CandidateKind {
    Variable,
    Function,
    Label,
}

/// Names that can complete at `pos`: labels after `goto` or inside a label
/// statement, otherwise variables. Filtered by the identifier prefix the
/// cursor sits in, deduplicated by shadowing.
pub(crate) fn candidates(
    file: &WorkspaceFile,
    pos: Position,
    cancel: &CancelToken,
) -> Result<Vec<Candidate>> {
    let resolved = position::resolve(file, pos)?;
    let tree = &file.tree;

    // A cursor at the end of an identifier lands on the following token's
    // leading trivia. Back up so the identifier itself is the context.
    let mut token = resolved.token;
    let mut parent = resolved.parent.clone();
    if tree.token_range(token).start >= resolved.offset {
        if let Some(prev) = tree.previous_token(token) {
            if tree.token_range(prev).end == resolved.offset {
                token = prev;
                if let Some(p) = tree.token_parent(prev) {
                    parent = NodeRef::new(tree.clone(), p);
                }
            }
        }
    }

    // Names after `.` or `:` are looked up in a table, not the scope chain,
    // and a declaration position introduces a new name. Neither completes.
    match parent.kind() {
        NodeKind::MemberExpr | NodeKind::MethodCallExpr | NodeKind::FunctionName => {
            return Ok(Vec::new());
        }
        _ => {}
    }
    if let Some(var) = file.program.variable_at(&parent) {
        if var.declaration.as_ref() == Some(&parent) {
            return Ok(Vec::new());
        }
    }

    let token_range = tree.token_range(token);
    let prefix = if tree.token_kind(token) == TokenKind::Name
        && token_range.start < resolved.offset
        && resolved.offset <= token_range.end
    {
        &tree.text()[token_range.start..resolved.offset]
    } else {
        ""
    };

    let Some(scope) = file.program.scope_at(&parent) else {
        return Ok(Vec::new());
    };

    let in_goto = tree.token_kind(token) == TokenKind::GotoKw
        || tree
            .ancestors(parent.id)
            .any(|n| tree.kind(n) == NodeKind::GotoStmt);
    let in_label = tree
        .ancestors(parent.id)
        .any(|n| tree.kind(n) == NodeKind::LabelStmt);

    if in_goto || in_label {
        // A goto may target labels anywhere up the chain; authoring a label
        // only needs the names of the surrounding function.
        let bound = if in_goto {
            WalkBound::Root
        } else {
            WalkBound::NearestFunction
        };
        let labels = scope_walk::collect_labels(&scope, prefix, bound, cancel)?;
        return Ok(labels
            .into_iter()
            .map(|label| Candidate {
                name: label.name.clone(),
                kind: CandidateKind::Label,
            })
            .collect());
    }

    let variables =
        scope_walk::collect_variables(&file.program, &scope, prefix, WalkBound::Root, cancel)?;
    Ok(variables
        .into_iter()
        // The half-typed identifier itself registers as a global read; a
        // name whose only reference is the cursor's own node is not a
        // completion.
        .filter(|var| {
            !(var.writes.is_empty() && var.reads.len() == 1 && var.reads[0] == parent)
        })
        .map(|var| Candidate {
            kind: if var.is_function() {
                CandidateKind::Function
            } else {
                CandidateKind::Variable
            },
            name: var.name.clone(),
        })
        .collect())
}
