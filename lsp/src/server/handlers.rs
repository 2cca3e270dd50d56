use std::sync::Arc;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::LanguageServer;
use tracing::{info, warn};

use lls_syntax::{SyntaxTree, TextRange};

use crate::analyzer::completions::{self, CandidateKind};
use crate::analyzer::navigation::{self, HighlightKind};
use crate::analyzer::{formatting, semantic_tokens, CancelToken};
use crate::error::AnalyzeError;
use crate::workspace::{Edit, WorkspaceFile};

use super::state::LlsLanguageServer;

#[tower_lsp::async_trait]
impl LanguageServer for LlsLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Lua Language Server initializing, root: {:?}", params.root_uri);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: None,
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                references_provider: Some(OneOf::Left(true)),
                definition_provider: Some(OneOf::Left(true)),
                document_highlight_provider: Some(OneOf::Left(true)),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                        work_done_progress_options: Default::default(),
                        legend: SemanticTokensLegend {
                            // The classifier's indices are positions in these
                            // arrays; keep them as the single source.
                            token_types: semantic_tokens::TOKEN_TYPES
                                .iter()
                                .copied()
                                .map(SemanticTokenType::new)
                                .collect(),
                            token_modifiers: semantic_tokens::TOKEN_MODIFIERS
                                .iter()
                                .copied()
                                .map(SemanticTokenModifier::new)
                                .collect(),
                        },
                        range: Some(true),
                        full: Some(SemanticTokensFullOptions::Bool(true)),
                    }),
                ),
                document_formatting_provider: Some(OneOf::Left(true)),
                document_range_formatting_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "Lua Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("Lua Language Server initialized");
        let _ = self
            .client
            .log_message(MessageType::INFO, "Lua Language Server started")
            .await;
        self.load_config().await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Lua Language Server shutting down");
        Ok(())
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        self.load_config().await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let file = self.workspace.open_or_replace(&uri, &params.text_document.text);
        self.publish_diagnostics(&file).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(old) = self.workspace.get_if_open(&uri) else {
            // Out-of-order change; recover when the client sent full text.
            if let Some(change) = params.content_changes.iter().find(|c| c.range.is_none()) {
                let file = self.workspace.open_or_replace(&uri, &change.text);
                self.publish_diagnostics(&file).await;
            } else {
                warn!(uri = %uri, "change for untracked document dropped");
            }
            return;
        };

        let edits: Vec<Edit> = params
            .content_changes
            .into_iter()
            .map(|change| Edit {
                range: change
                    .range
                    .map(|r| (from_lsp_position(r.start), from_lsp_position(r.end))),
                text: change.text,
            })
            .collect();

        match self.workspace.apply_edits(&old, &edits) {
            Ok(new) => self.publish_diagnostics(&new).await,
            Err(e) => warn!(uri = %uri, error = %e, "failed to apply edits"),
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Some(text) = params.text else {
            return;
        };
        let uri = params.text_document.uri;
        let Some(old) = self.workspace.get_if_open(&uri) else {
            return;
        };
        match self.workspace.update(&old, &text) {
            Ok(new) => self.publish_diagnostics(&new).await,
            Err(e) => warn!(uri = %uri, error = %e, "failed to sync saved text"),
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.workspace.remove(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let Some(file) = self.workspace.get_if_open(uri) else {
            return Ok(None);
        };
        let pos = from_lsp_position(params.text_document_position.position);

        let cancel = CancelToken::new();
        let candidates = match completions::candidates(&file, pos, &cancel) {
            Ok(candidates) => candidates,
            Err(AnalyzeError::Cancelled) => return Ok(None),
            Err(e) => return Err(fault(e)),
        };

        let mut items: Vec<CompletionItem> = candidates
            .into_iter()
            .map(|c| CompletionItem {
                label: c.name,
                kind: Some(match c.kind {
                    CandidateKind::Variable => CompletionItemKind::VARIABLE,
                    CandidateKind::Function => CompletionItemKind::FUNCTION,
                    CandidateKind::Label => CompletionItemKind::REFERENCE,
                }),
                ..Default::default()
            })
            .collect();
        items.extend(self.keyword_completions());
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let Some(file) = self.workspace.get_if_open(uri) else {
            return Ok(None);
        };
        let pos = from_lsp_position(params.text_document_position_params.position);

        match navigation::definition(&self.workspace, &file, pos) {
            Ok(sites) => {
                let locations: Vec<Location> = sites.into_iter().map(site_to_location).collect();
                if locations.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(GotoDefinitionResponse::Array(locations)))
                }
            }
            Err(AnalyzeError::NotFound(_)) | Err(AnalyzeError::Cancelled) => Ok(None),
            Err(e) => Err(fault(e)),
        }
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = &params.text_document_position.text_document.uri;
        let Some(file) = self.workspace.get_if_open(uri) else {
            return Ok(None);
        };
        let pos = from_lsp_position(params.text_document_position.position);

        match navigation::references(&self.workspace, &file, pos) {
            Ok(sites) => Ok(Some(sites.into_iter().map(site_to_location).collect())),
            Err(AnalyzeError::NotFound(_)) | Err(AnalyzeError::Cancelled) => Ok(None),
            Err(e) => Err(fault(e)),
        }
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let Some(file) = self.workspace.get_if_open(uri) else {
            return Ok(None);
        };
        let pos = from_lsp_position(params.text_document_position_params.position);

        match navigation::document_highlight(&file, pos) {
            Ok(spans) => Ok(Some(
                spans
                    .into_iter()
                    .map(|(range, kind)| DocumentHighlight {
                        range: to_lsp_range(&file.tree, range),
                        kind: Some(match kind {
                            HighlightKind::Read => DocumentHighlightKind::READ,
                            HighlightKind::Write => DocumentHighlightKind::WRITE,
                            HighlightKind::Text => DocumentHighlightKind::TEXT,
                        }),
                    })
                    .collect(),
            )),
            Err(AnalyzeError::NotFound(_)) | Err(AnalyzeError::Cancelled) => Ok(None),
            Err(e) => Err(fault(e)),
        }
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let uri = params.text_document.uri;
        if let Some(cached) = self.token_cache.get(&uri) {
            return Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
                result_id: None,
                data: cached.value().as_ref().clone(),
            })));
        }
        let Some(file) = self.workspace.get_if_open(&uri) else {
            return Ok(None);
        };

        let cancel = CancelToken::new();
        let records = match semantic_tokens::classify(&file, &cancel) {
            Ok(records) => records,
            Err(AnalyzeError::Cancelled) => return Ok(None),
            Err(e) => return Err(fault(e)),
        };
        let mut data = semantic_tokens::to_lsp_tokens(&records);
        let max = self.config.lock().unwrap().max_semantic_tokens;
        data.truncate(max);

        self.token_cache.insert(uri, Arc::new(data.clone()));
        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        })))
    }

    async fn semantic_tokens_range(
        &self,
        params: SemanticTokensRangeParams,
    ) -> Result<Option<SemanticTokensRangeResult>> {
        let uri = &params.text_document.uri;
        let Some(file) = self.workspace.get_if_open(uri) else {
            return Ok(None);
        };

        let cancel = CancelToken::new();
        let records = match semantic_tokens::classify_lines(
            &file,
            params.range.start.line,
            params.range.end.line,
            &cancel,
        ) {
            Ok(records) => records,
            Err(AnalyzeError::Cancelled) => return Ok(None),
            Err(e) => return Err(fault(e)),
        };
        let mut data = semantic_tokens::to_lsp_tokens(&records);
        let max = self.config.lock().unwrap().max_semantic_tokens;
        data.truncate(max);

        Ok(Some(SemanticTokensRangeResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        })))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let uri = &params.text_document.uri;
        let Some(file) = self.workspace.get_if_open(uri) else {
            return Ok(None);
        };
        let indent = indent_unit(&params.options);
        let eol = self.config.lock().unwrap().eol.clone();

        let changes = formatting::format_document(&file, &indent, &eol);
        Ok(Some(changes_to_edits(&file, changes)))
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let uri = &params.text_document.uri;
        let Some(file) = self.workspace.get_if_open(uri) else {
            return Ok(None);
        };
        let indent = indent_unit(&params.options);
        let eol = self.config.lock().unwrap().eol.clone();

        match formatting::format_range(
            &file,
            from_lsp_position(params.range.start),
            from_lsp_position(params.range.end),
            &indent,
            &eol,
        ) {
            Ok(changes) => Ok(Some(changes_to_edits(&file, changes))),
            Err(AnalyzeError::Cancelled) => Ok(None),
            Err(e) => Err(fault(e)),
        }
    }
}

impl LlsLanguageServer {
    async fn publish_diagnostics(&self, file: &WorkspaceFile) {
        let tree = &file.tree;
        let diagnostics = tree
            .diagnostics()
            .iter()
            .map(|d| Diagnostic {
                range: to_lsp_range(tree, d.range),
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some("lls".to_string()),
                message: d.message.clone(),
                ..Default::default()
            })
            .collect();
        self.client
            .publish_diagnostics(file.uri.clone(), diagnostics, None)
            .await;
    }
}

fn fault(err: AnalyzeError) -> tower_lsp::jsonrpc::Error {
    tower_lsp::jsonrpc::Error::invalid_params(err.to_string())
}

fn from_lsp_position(pos: Position) -> lls_syntax::Position {
    lls_syntax::Position::new(pos.line, pos.character)
}

fn to_lsp_range(tree: &SyntaxTree, range: TextRange) -> Range {
    let index = tree.line_index();
    let start = index.position(tree.text(), range.start);
    let end = index.position(tree.text(), range.end);
    Range::new(
        Position::new(start.line, start.character),
        Position::new(end.line, end.character),
    )
}

fn site_to_location(site: navigation::Site) -> Location {
    let range = to_lsp_range(&site.node.tree, site.node.range());
    Location::new(site.uri, range)
}

fn indent_unit(options: &FormattingOptions) -> String {
    if options.insert_spaces {
        " ".repeat(options.tab_size as usize)
    } else {
        "\t".to_string()
    }
}

fn changes_to_edits(file: &WorkspaceFile, changes: Vec<lls_syntax::format::TextChange>) -> Vec<TextEdit> {
    changes
        .into_iter()
        .map(|change| TextEdit {
            range: to_lsp_range(&file.tree, change.range),
            new_text: change.text,
        })
        .collect()
}
