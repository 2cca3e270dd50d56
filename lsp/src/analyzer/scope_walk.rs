//! Outward scope walks collecting visible variables and labels. Inner
//! declarations shadow outer ones of the same name.

use std::collections::HashSet;
use std::sync::Arc;

use lls_syntax::{GotoLabel, Program, Scope, ScopeKind, Variable};

use crate::analyzer::CancelToken;
use crate::error::Result;

/// Where an outward walk stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WalkBound {
    /// Stop after the innermost enclosing function (or file) scope.
    NearestFunction,
    /// Walk all the way to the file scope.
    Root,
}

/// Variables visible from `scope`, innermost first, filtered by a
/// case-sensitive name prefix. Shadowed outer variables are dropped.
pub(crate) fn collect_variables(
    program: &Program,
    scope: &Scope,
    prefix: &str,
    bound: WalkBound,
    cancel: &CancelToken,
) -> Result<Vec<Arc<Variable>>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    let mut current = Some(scope.clone());
    while let Some(scope) = current {
        cancel.checkpoint()?;
        for var in scope.variables(program) {
            cancel.checkpoint()?;
            if !var.name.starts_with(prefix) {
                continue;
            }
            if seen.insert(var.name.clone()) {
                out.push(var);
            }
        }
        if stops_at(&scope, bound) {
            break;
        }
        current = scope.parent();
    }
    Ok(out)
}

/// Labels visible from `scope`, innermost first, filtered by prefix.
pub(crate) fn collect_labels(
    scope: &Scope,
    prefix: &str,
    bound: WalkBound,
    cancel: &CancelToken,
) -> Result<Vec<Arc<GotoLabel>>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    let mut current = Some(scope.clone());
    while let Some(scope) = current {
        cancel.checkpoint()?;
        for label in scope.labels() {
            cancel.checkpoint()?;
            if !label.name.starts_with(prefix) {
                continue;
            }
            if seen.insert(label.name.clone()) {
                out.push(label);
            }
        }
        if stops_at(&scope, bound) {
            break;
        }
        current = scope.parent();
    }
    Ok(out)
}

fn stops_at(scope: &Scope, bound: WalkBound) -> bool {
    match bound {
        WalkBound::Root => scope.parent().is_none(),
        WalkBound::NearestFunction => {
            matches!(scope.kind(), ScopeKind::Function | ScopeKind::File)
        }
    }
}
