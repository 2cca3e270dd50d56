use serde::Deserialize;
use tower_lsp::lsp_types::ConfigurationItem;

use super::state::LlsLanguageServer;
use super::MAX_SEMANTIC_TOKENS;

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) max_semantic_tokens: usize,
    pub(crate) eol: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_semantic_tokens: MAX_SEMANTIC_TOKENS,
            eol: "\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LlsConfigSection {
    #[serde(default)]
    performance: PerformanceConfig,
    #[serde(default)]
    formatting: FormattingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PerformanceConfig {
    #[serde(default)]
    max_semantic_tokens: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FormattingConfig {
    #[serde(default)]
    end_of_line: Option<String>,
}

impl LlsLanguageServer {
    pub(crate) async fn load_config(&self) {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some("lls.lsp".to_string()),
        }];

        if let Ok(values) = self.client.configuration(items).await {
            if let Some(val) = values.into_iter().next() {
                if let Ok(cfg) = serde_json::from_value::<LlsConfigSection>(val) {
                    let mut guard = self.config.lock().unwrap();
                    if let Some(v) = cfg.performance.max_semantic_tokens.filter(|v| *v > 0) {
                        guard.max_semantic_tokens = v;
                    }
                    if let Some(v) = cfg
                        .formatting
                        .end_of_line
                        .filter(|v| v == "\n" || v == "\r\n")
                    {
                        guard.eol = v;
                    }
                }
            }
        }
    }
}
