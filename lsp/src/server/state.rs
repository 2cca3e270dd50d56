use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, SemanticToken, Url};
use tower_lsp::Client;

use crate::workspace::Workspace;

/// Primary LSP server state shared across handlers.
pub(crate) struct LlsLanguageServer {
    pub(crate) client: Client,
    pub(crate) workspace: Arc<Workspace>,
    /// Full-document semantic token results, dropped on every edit.
    pub(crate) token_cache: Arc<DashMap<Url, Arc<Vec<SemanticToken>>>>,
    pub(crate) config: Mutex<super::config::ServerConfig>,
}

impl LlsLanguageServer {
    pub(crate) fn new(client: Client) -> Self {
        let workspace = Arc::new(Workspace::new());
        let token_cache: Arc<DashMap<Url, Arc<Vec<SemanticToken>>>> = Arc::new(DashMap::new());

        let cache = token_cache.clone();
        workspace.on_update(move |_, new| {
            cache.remove(&new.uri);
        });
        let cache = token_cache.clone();
        workspace.on_remove(move |last| {
            cache.remove(&last.uri);
        });

        Self {
            client,
            workspace,
            token_cache,
            config: Mutex::new(super::config::ServerConfig::default()),
        }
    }

    pub(crate) fn keyword_completions(&self) -> Vec<CompletionItem> {
        let keywords = [
            "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto",
            "if", "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until",
            "while",
        ];

        keywords
            .iter()
            .map(|keyword| CompletionItem {
                label: keyword.to_string(),
                kind: Some(CompletionItemKind::KEYWORD),
                detail: Some("Lua keyword".to_string()),
                ..Default::default()
            })
            .collect()
    }
}
