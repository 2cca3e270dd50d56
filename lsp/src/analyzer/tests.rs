use lls_syntax::Position;
use url::Url;

use super::completions::{self, CandidateKind};
use super::formatting;
use super::navigation::{self, HighlightKind};
use super::position;
use super::scope_walk::{self, WalkBound};
use super::semantic_tokens::{self, TokenRecord};
use super::CancelToken;
use crate::error::AnalyzeError;
use crate::workspace::{Workspace, WorkspaceFile};

fn open(ws: &Workspace, name: &str, text: &str) -> WorkspaceFile {
    let uri = Url::parse(&format!("file:///ws/{name}")).unwrap();
    ws.open_or_replace(&uri, text)
}

fn single(text: &str) -> (Workspace, WorkspaceFile) {
    let ws = Workspace::new();
    let file = open(&ws, "main.lua", text);
    (ws, file)
}

#[test]
fn test_resolve_position() {
    let (_ws, file) = single("local x = 1");
    let resolved = position::resolve(&file, Position::new(0, 6)).unwrap();
    assert_eq!(resolved.offset, 6);
    assert_eq!(resolved.parent.kind(), lls_syntax::NodeKind::NameExpr);
    assert!(file.tree.token_range(resolved.token).contains(6));
}

#[test]
fn test_resolve_rejects_position_outside_document() {
    let (_ws, file) = single("local x = 1");
    let err = position::resolve(&file, Position::new(9, 0)).unwrap_err();
    assert!(matches!(err, AnalyzeError::MalformedPosition { line: 9, .. }));
}

#[test]
fn test_completion_dedups_shadowed_variable() {
    let (_ws, file) = single("local a = 1\nlocal function f()\n  local a = 2\n  return a\nend\n");
    let cancel = CancelToken::new();
    // Cursor at the end of `a` in `return a`.
    let candidates = completions::candidates(&file, Position::new(3, 10), &cancel).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "a");
    assert_eq!(candidates[0].kind, CandidateKind::Variable);
}

#[test]
fn test_completion_after_goto_offers_labels() {
    let (_ws, file) = single("while true do\n  goto done\nend\n::done::\n");
    let cancel = CancelToken::new();
    let candidates = completions::candidates(&file, Position::new(1, 11), &cancel).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "done");
    assert_eq!(candidates[0].kind, CandidateKind::Label);
}

#[test]
fn test_completion_marks_functions() {
    let (_ws, file) = single("local function fun() end\nlocal fur = 1\nreturn fu\n");
    let cancel = CancelToken::new();
    let candidates = completions::candidates(&file, Position::new(2, 9), &cancel).unwrap();
    let mut names: Vec<_> = candidates
        .iter()
        .map(|c| (c.name.as_str(), c.kind))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            ("fun", CandidateKind::Function),
            ("fur", CandidateKind::Variable),
        ]
    );
}

#[test]
fn test_completion_suppressed_after_member_access() {
    let (_ws, file) = single("local t = {}\nreturn t.x\n");
    let cancel = CancelToken::new();
    // Cursor at the end of `x` in `t.x`.
    let candidates = completions::candidates(&file, Position::new(1, 10), &cancel).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn test_completion_suppressed_at_declaration_name() {
    let (_ws, file) = single("local apple = 1\nlocal app = 2\n");
    let cancel = CancelToken::new();
    // Cursor at the end of the declared name `app`. It introduces a new
    // binding, so nothing in scope applies.
    let candidates = completions::candidates(&file, Position::new(1, 9), &cancel).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn test_scope_walk_stops_at_function_bound() {
    let (_ws, file) = single("local outer = 1\nlocal function f()\n  local inner = 2\nend\n");
    let cancel = CancelToken::new();
    // Scope of the `inner` declaration site.
    let resolved = position::resolve(&file, Position::new(2, 8)).unwrap();
    let scope = file.program.scope_at(&resolved.parent).unwrap();

    let to_root =
        scope_walk::collect_variables(&file.program, &scope, "", WalkBound::Root, &cancel).unwrap();
    let names: Vec<_> = to_root.iter().map(|v| v.name.as_str()).collect();
    assert!(names.contains(&"outer"));
    assert!(names.contains(&"inner"));

    let bounded = scope_walk::collect_variables(
        &file.program,
        &scope,
        "",
        WalkBound::NearestFunction,
        &cancel,
    )
    .unwrap();
    let names: Vec<_> = bounded.iter().map(|v| v.name.as_str()).collect();
    assert!(names.contains(&"inner"));
    assert!(!names.contains(&"outer"));
}

#[test]
fn test_definition_of_global_crosses_files() {
    let ws = Workspace::new();
    open(&ws, "a.lua", "shared = 1");
    let b = open(&ws, "b.lua", "print(shared)");

    let sites = navigation::definition(&ws, &b, Position::new(0, 6)).unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].uri.as_str(), "file:///ws/a.lua");
    assert_eq!(sites[0].node.text(), "shared");
}

#[test]
fn test_references_include_reads_and_writes() {
    let ws = Workspace::new();
    open(&ws, "a.lua", "shared = 1");
    let b = open(&ws, "b.lua", "print(shared)");

    let sites = navigation::references(&ws, &b, Position::new(0, 6)).unwrap();
    let uris: Vec<_> = sites.iter().map(|s| s.uri.as_str()).collect();
    assert_eq!(uris, vec!["file:///ws/a.lua", "file:///ws/b.lua"]);
}

#[test]
fn test_definition_of_local_uses_declaration() {
    let (ws, file) = single("local x = 1\nreturn x\n");
    let sites = navigation::definition(&ws, &file, Position::new(1, 7)).unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].node.range().start, 6);
}

#[test]
fn test_highlight_tags_reads_and_writes() {
    let (_ws, file) = single("local x = 1\nreturn x + x\n");
    let spans = navigation::document_highlight(&file, Position::new(1, 7)).unwrap();
    let kinds: Vec<_> = spans
        .iter()
        .map(|(range, kind)| (range.start, *kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (6, HighlightKind::Write),
            (19, HighlightKind::Read),
            (23, HighlightKind::Read),
        ]
    );
}

#[test]
fn test_highlight_on_keyword_lights_statement_keywords() {
    let (_ws, file) = single("if x then return 1 else return 2 end");
    let spans = navigation::document_highlight(&file, Position::new(0, 0)).unwrap();
    let starts: Vec<_> = spans.iter().map(|(range, _)| range.start).collect();
    // if, then, else, end; the inner return keywords stay dark.
    assert_eq!(starts, vec![0, 5, 19, 33]);
    assert!(spans.iter().all(|(_, kind)| *kind == HighlightKind::Text));
}

#[test]
fn test_classify_local_declaration() {
    let (_ws, file) = single("local x = 1");
    let cancel = CancelToken::new();
    let records = semantic_tokens::classify(&file, &cancel).unwrap();
    assert_eq!(
        records,
        vec![
            TokenRecord {
                line: 0,
                start: 0,
                length: 5,
                token_type: semantic_tokens::KEYWORD,
                modifiers: 0,
            },
            TokenRecord {
                line: 0,
                start: 6,
                length: 1,
                token_type: semantic_tokens::VARIABLE,
                modifiers: semantic_tokens::READONLY,
            },
            TokenRecord {
                line: 0,
                start: 10,
                length: 1,
                token_type: semantic_tokens::NUMBER,
                modifiers: 0,
            },
        ]
    );
}

#[test]
fn test_classify_standard_library_call() {
    let (_ws, file) = single("print(\"hi\")");
    let cancel = CancelToken::new();
    let records = semantic_tokens::classify(&file, &cancel).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].token_type, semantic_tokens::FUNCTION);
    assert_eq!(
        records[0].modifiers,
        semantic_tokens::READONLY | semantic_tokens::STATIC | semantic_tokens::DEFAULT_LIBRARY
    );
    assert_eq!(records[1].token_type, semantic_tokens::STRING);
}

#[test]
fn test_classify_splits_multi_line_comment() {
    let (_ws, file) = single("--[[x\nyyyy\nzz]]\nreturn 1\n");
    let cancel = CancelToken::new();
    let records = semantic_tokens::classify(&file, &cancel).unwrap();
    let comments: Vec<_> = records
        .iter()
        .filter(|r| r.token_type == semantic_tokens::COMMENT)
        .map(|r| (r.line, r.start, r.length))
        .collect();
    assert_eq!(comments, vec![(0, 0, 5), (1, 0, 4), (2, 0, 4)]);
}

#[test]
fn test_classify_keeps_blank_comment_lines() {
    let (_ws, file) = single("--[[a\n\nb]]\nreturn 1\n");
    let cancel = CancelToken::new();
    let records = semantic_tokens::classify(&file, &cancel).unwrap();
    let comments: Vec<_> = records
        .iter()
        .filter(|r| r.token_type == semantic_tokens::COMMENT)
        .map(|r| (r.line, r.start, r.length))
        .collect();
    // The empty middle line still carries a zero-length record.
    assert_eq!(comments, vec![(0, 0, 5), (1, 0, 0), (2, 0, 3)]);
}

#[test]
fn test_classify_is_deterministic() {
    let text = "local t = { a = 1 }\nfunction t.m(self, n)\n  return self.a + n\nend\n";
    let (_ws, file) = single(text);
    let cancel = CancelToken::new();
    let first = semantic_tokens::classify(&file, &cancel).unwrap();
    let second = semantic_tokens::classify(&file, &cancel).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        semantic_tokens::to_lsp_tokens(&first),
        semantic_tokens::to_lsp_tokens(&second)
    );
}

#[test]
fn test_delta_encoding() {
    let records = vec![
        TokenRecord {
            line: 0,
            start: 2,
            length: 3,
            token_type: semantic_tokens::KEYWORD,
            modifiers: 0,
        },
        TokenRecord {
            line: 0,
            start: 8,
            length: 1,
            token_type: semantic_tokens::VARIABLE,
            modifiers: 0,
        },
        TokenRecord {
            line: 2,
            start: 4,
            length: 2,
            token_type: semantic_tokens::NUMBER,
            modifiers: 0,
        },
    ];
    let tokens = semantic_tokens::to_lsp_tokens(&records);
    let deltas: Vec<_> = tokens
        .iter()
        .map(|t| (t.delta_line, t.delta_start, t.length))
        .collect();
    assert_eq!(deltas, vec![(0, 2, 3), (0, 6, 1), (2, 4, 2)]);
}

#[test]
fn test_classify_lines_filters_by_line() {
    let (_ws, file) = single("local a = 1\nlocal b = 2\nlocal c = 3\n");
    let cancel = CancelToken::new();
    let records = semantic_tokens::classify_lines(&file, 1, 1, &cancel).unwrap();
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r.line == 1));
}

#[test]
fn test_cancelled_classification_stops() {
    let (_ws, file) = single("local x = 1");
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = semantic_tokens::classify(&file, &cancel).unwrap_err();
    assert!(matches!(err, AnalyzeError::Cancelled));
}

#[test]
fn test_format_document_normalizes_spacing() {
    let (_ws, file) = single("local x=1\n");
    let changes = formatting::format_document(&file, "  ", "\n");
    assert_eq!(changes.len(), 1);
    let mut text = file.tree.text().to_string();
    for change in &changes {
        text.replace_range(change.range.start..change.range.end, &change.text);
    }
    assert_eq!(text, "local x = 1\n");
}

#[test]
fn test_format_document_without_changes_is_empty() {
    let (_ws, file) = single("local x = 1\n");
    assert!(formatting::format_document(&file, "  ", "\n").is_empty());
}

#[test]
fn test_format_range_covers_whole_statement() {
    let (_ws, file) = single("local a = 1\nlocal b=2\n");
    let changes = formatting::format_range(
        &file,
        Position::new(1, 6),
        Position::new(1, 7),
        "  ",
        "\n",
    )
    .unwrap();
    let mut text = file.tree.text().to_string();
    for change in changes.iter().rev() {
        text.replace_range(change.range.start..change.range.end, &change.text);
    }
    assert_eq!(text, "local a = 1\nlocal b = 2\n");
}

#[test]
fn test_format_range_outside_statement_is_empty() {
    let (_ws, file) = single("-- just a note\n");
    let changes = formatting::format_range(
        &file,
        Position::new(0, 0),
        Position::new(0, 5),
        "  ",
        "\n",
    )
    .unwrap();
    assert!(changes.is_empty());
}
