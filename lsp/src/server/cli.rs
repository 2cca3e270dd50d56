use std::path::{Component, Path};

use anyhow::Context;
use url::Url;

use crate::analyzer::{semantic_tokens, CancelToken};
use crate::workspace::Workspace;

/// Handles `lls-lsp --check <file>` before the LSP loop starts. Returns the
/// JSON report, or `None` when no check was requested.
pub(crate) fn try_cli_check() -> anyhow::Result<Option<String>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() <= 1 {
        return Ok(None);
    }

    let Some(i) = args.iter().position(|a| a == "--check") else {
        return Ok(None);
    };
    let path = args
        .get(i + 1)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Usage: lls-lsp --check <relative-file-path>"))?;

    let content = read_file_content(&path)?;
    let abs = std::fs::canonicalize(&path)
        .with_context(|| format!("Failed to resolve path '{}'", path))?;
    let uri = Url::from_file_path(&abs)
        .map_err(|_| anyhow::anyhow!("Path '{}' is not a valid file url", path))?;

    let workspace = Workspace::new();
    let file = workspace.open_or_replace(&uri, &content);

    let index = file.tree.line_index();
    let text = file.tree.text();
    let diagnostics: Vec<_> = file
        .tree
        .diagnostics()
        .iter()
        .map(|d| {
            let start = index.position(text, d.range.start);
            let end = index.position(text, d.range.end);
            serde_json::json!({
                "message": d.message,
                "start": { "line": start.line, "character": start.character },
                "end": { "line": end.line, "character": end.character },
            })
        })
        .collect();

    let cancel = CancelToken::new();
    let records = semantic_tokens::classify(&file, &cancel)?;
    let tokens_simple: Vec<[u32; 5]> = semantic_tokens::to_lsp_tokens(&records)
        .iter()
        .map(|t| {
            [
                t.delta_line,
                t.delta_start,
                t.length,
                t.token_type,
                t.token_modifiers_bitset,
            ]
        })
        .collect();

    let output = serde_json::json!({
        "diagnostics": diagnostics,
        "semantic_tokens": tokens_simple,
    });
    Ok(Some(serde_json::to_string_pretty(&output)?))
}

pub(crate) fn is_safe_path(path: &str) -> bool {
    let path = Path::new(path);

    if path.as_os_str().is_empty() {
        return false;
    }
    if path.is_absolute() {
        return false;
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return false;
    }

    let s = path.to_string_lossy();
    let suspicious = ['\0', '\n', '\r', '\t'];
    if s.chars().any(|c| suspicious.contains(&c)) {
        return false;
    }
    if s.len() >= 2 && s.as_bytes()[1] == b':' {
        return false;
    }
    true
}

pub(crate) fn read_file_content(path: &str) -> anyhow::Result<String> {
    if !is_safe_path(path) {
        return Err(anyhow::anyhow!("Unsafe file path: {}", path));
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path))
}
