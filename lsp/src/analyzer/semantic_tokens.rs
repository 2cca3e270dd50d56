//! Semantic token classification. Every token of the file is classified in
//! one pass over the token sequence, trivia included, then delta-encoded
//! into the LSP wire format.

use lls_syntax::{
    LineIndex, NodeKind, NodeRef, TextRange, TokenId, TokenKind, VariableKind,
};
use tower_lsp::lsp_types::SemanticToken;

use crate::analyzer::CancelToken;
use crate::error::Result;
use crate::workspace::WorkspaceFile;

/// Token type legend, in index order.
pub(crate) const TOKEN_TYPES: [&str; 11] = [
    "comment",
    "keyword",
    "variable",
    "function",
    "string",
    "number",
    "operator",
    "parameter",
    "property",
    "method",
    "type",
];

pub(crate) const COMMENT: u32 = 0;
pub(crate) const KEYWORD: u32 = 1;
pub(crate) const VARIABLE: u32 = 2;
pub(crate) const FUNCTION: u32 = 3;
pub(crate) const STRING: u32 = 4;
pub(crate) const NUMBER: u32 = 5;
pub(crate) const OPERATOR: u32 = 6;
pub(crate) const PARAMETER: u32 = 7;
pub(crate) const PROPERTY: u32 = 8;
pub(crate) const METHOD: u32 = 9;
pub(crate) const TYPE: u32 = 10;

/// Token modifier legend, in bit order.
pub(crate) const TOKEN_MODIFIERS: [&str; 3] = ["readonly", "static", "defaultLibrary"];

pub(crate) const READONLY: u32 = 1;
pub(crate) const STATIC: u32 = 2;
pub(crate) const DEFAULT_LIBRARY: u32 = 4;

/// One classified span. Multi-line trivia is split into one record per line,
/// so `start` and `length` are always within a single line, in UTF-16 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenRecord {
    pub(crate) line: u32,
    pub(crate) start: u32,
    pub(crate) length: u32,
    pub(crate) token_type: u32,
    pub(crate) modifiers: u32,
}

/// Classifies every token of the snapshot, in source order.
pub(crate) fn classify(file: &WorkspaceFile, cancel: &CancelToken) -> Result<Vec<TokenRecord>> {
    let tree = &file.tree;
    let text = tree.text();
    let index = tree.line_index();
    let mut records = Vec::new();

    for i in 0..tree.token_count() {
        cancel.checkpoint()?;
        let token = TokenId(i as u32);
        for trivia in tree.token_trivia(token) {
            if trivia.kind.is_comment() {
                push_span(index, text, trivia.range, COMMENT, 0, &mut records);
            }
        }
        if let Some((token_type, modifiers)) = classify_token(file, token) {
            push_span(index, text, tree.token_range(token), token_type, modifiers, &mut records);
        }
    }
    Ok(records)
}

/// Classifies only the tokens overlapping the given line range.
pub(crate) fn classify_lines(
    file: &WorkspaceFile,
    first_line: u32,
    last_line: u32,
    cancel: &CancelToken,
) -> Result<Vec<TokenRecord>> {
    let records = classify(file, cancel)?;
    Ok(records
        .into_iter()
        .filter(|r| r.line >= first_line && r.line <= last_line)
        .collect())
}

/// Delta-encodes records into the LSP semantic token stream. Records must be
/// sorted by line and start, which [`classify`] guarantees.
pub(crate) fn to_lsp_tokens(records: &[TokenRecord]) -> Vec<SemanticToken> {
    let mut tokens = Vec::with_capacity(records.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;
    let mut first = true;
    for record in records {
        let delta_line = if first { record.line } else { record.line - prev_line };
        let delta_start = if delta_line == 0 && !first {
            record.start - prev_start
        } else {
            record.start
        };
        tokens.push(SemanticToken {
            delta_line,
            delta_start,
            length: record.length,
            token_type: record.token_type,
            token_modifiers_bitset: record.modifiers,
        });
        prev_line = record.line;
        prev_start = record.start;
        first = false;
    }
    tokens
}

fn classify_token(file: &WorkspaceFile, token: TokenId) -> Option<(u32, u32)> {
    let tree = &file.tree;
    let kind = tree.token_kind(token);
    if kind.is_keyword() {
        return Some((KEYWORD, 0));
    }
    match kind {
        TokenKind::Number => return Some((NUMBER, 0)),
        TokenKind::Str => return Some((STRING, 0)),
        TokenKind::Name => {}
        _ => {
            if kind.is_operator() {
                let parent = tree.token_parent(token)?;
                if matches!(
                    tree.kind(parent),
                    NodeKind::UnaryExpr | NodeKind::BinaryExpr
                ) {
                    return Some((OPERATOR, 0));
                }
            }
            return None;
        }
    }

    let parent = tree.token_parent(token)?;
    match tree.kind(parent) {
        NodeKind::MemberExpr | NodeKind::TableField => Some((PROPERTY, 0)),
        NodeKind::MethodCallExpr => Some((METHOD, 0)),
        NodeKind::FunctionName => {
            // `function a.b.c()` names properties; `function a:m()` names a
            // method after the colon.
            if follows_colon(file, token) {
                Some((METHOD, 0))
            } else {
                Some((PROPERTY, 0))
            }
        }
        NodeKind::LabelStmt | NodeKind::GotoStmt => Some((VARIABLE, 0)),
        NodeKind::NameExpr => classify_name_expr(file, NodeRef::new(tree.clone(), parent)),
        _ => None,
    }
}

fn classify_name_expr(file: &WorkspaceFile, name: NodeRef) -> Option<(u32, u32)> {
    let tree = &file.tree;
    if let Some(parent) = name.parent() {
        if parent.kind() == NodeKind::ParamList {
            return Some((PARAMETER, 0));
        }
    }

    let Some(var) = file.program.variable_at(&name) else {
        return Some((VARIABLE, 0));
    };
    if var.kind == VariableKind::Parameter {
        return Some((PARAMETER, 0));
    }
    if var.kind == VariableKind::Global && var.writes.is_empty() {
        if lls_stdlib::is_function(&var.name) {
            return Some((FUNCTION, READONLY | STATIC | DEFAULT_LIBRARY));
        }
        if lls_stdlib::is_type(&var.name) {
            return Some((TYPE, READONLY | STATIC | DEFAULT_LIBRARY));
        }
    }

    let mut modifiers = 0;
    if var.writes.len() <= 1 {
        modifiers |= READONLY;
    }
    if var.kind == VariableKind::Global {
        modifiers |= STATIC;
    }

    let is_callee = name
        .parent()
        .map(|p| {
            p.kind() == NodeKind::CallExpr
                && tree.child_nodes(p.id).next() == Some(name.id)
        })
        .unwrap_or(false);
    if var.is_function() || is_callee {
        return Some((FUNCTION, modifiers));
    }
    Some((VARIABLE, modifiers))
}

/// Whether a raw token inside a `FunctionName` sits after the `:`.
fn follows_colon(file: &WorkspaceFile, token: TokenId) -> bool {
    let tree = &file.tree;
    tree.previous_token(token)
        .map(|prev| tree.token_kind(prev) == TokenKind::Colon)
        .unwrap_or(false)
}

/// Emits one record per line covered by `range`.
fn push_span(
    index: &LineIndex,
    text: &str,
    range: TextRange,
    token_type: u32,
    modifiers: u32,
    out: &mut Vec<TokenRecord>,
) {
    let start = index.position(text, range.start);
    let end = index.position(text, range.end);
    if start.line == end.line {
        out.push(TokenRecord {
            line: start.line,
            start: start.character,
            length: end.character - start.character,
            token_type,
            modifiers,
        });
        return;
    }
    for line in start.line..=end.line {
        let Some(line_len) = index.line_len_utf16(line, text) else {
            continue;
        };
        let (col, length) = if line == start.line {
            (start.character, line_len.saturating_sub(start.character))
        } else if line == end.line {
            (0, end.character)
        } else {
            (0, line_len)
        };
        out.push(TokenRecord {
            line,
            start: col,
            length,
            token_type,
            modifiers,
        });
    }
}
