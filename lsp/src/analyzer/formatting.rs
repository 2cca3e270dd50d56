//! Whole-document and range formatting over the normalizer.

use lls_syntax::format::{self, TextChange};
use lls_syntax::{Position, TextRange};

use crate::error::Result;
use crate::workspace::WorkspaceFile;

/// Reprints the whole document and returns the minimal replacement needed
/// to reach the normalized text.
pub(crate) fn format_document(
    file: &WorkspaceFile,
    indent_unit: &str,
    eol: &str,
) -> Vec<TextChange> {
    let tree = &file.tree;
    let formatted = format::normalize(tree, tree.root(), indent_unit, eol);
    format::text_changes(tree.text(), &formatted, 0)
}

/// Reformats the smallest whole statement covering the selection. Selections
/// that sit outside any statement produce no changes.
pub(crate) fn format_range(
    file: &WorkspaceFile,
    start: Position,
    end: Position,
    indent_unit: &str,
    eol: &str,
) -> Result<Vec<TextChange>> {
    let tree = &file.tree;
    let index = tree.line_index();
    let text = tree.text();
    let invalid = |pos: Position| crate::error::AnalyzeError::MalformedPosition {
        line: pos.line,
        character: pos.character,
    };
    let start_offset = index.offset(text, start).ok_or_else(|| invalid(start))?;
    let end_offset = index.offset(text, end).ok_or_else(|| invalid(end))?;
    let covering = tree.covering_node(TextRange::new(
        start_offset.min(end_offset),
        start_offset.max(end_offset),
    ));
    let Some(stmt) = tree
        .ancestors(covering)
        .find(|&n| tree.kind(n).is_statement())
    else {
        return Ok(Vec::new());
    };

    let formatted = format::normalize(tree, stmt, indent_unit, eol);
    let base = tree.range(stmt).start;
    Ok(format::text_changes(tree.node_text(stmt), &formatted, base))
}
