//! Query implementations behind the LSP handlers. Every function here takes
//! an immutable [`WorkspaceFile`](crate::workspace::WorkspaceFile) snapshot,
//! so results are consistent even while the workspace keeps changing.

pub(crate) mod completions;
pub(crate) mod formatting;
pub(crate) mod locate;
pub(crate) mod navigation;
pub(crate) mod position;
pub(crate) mod scope_walk;
pub(crate) mod semantic_tokens;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{AnalyzeError, Result};

/// Cooperative cancellation flag shared between a request handler and the
/// walk it started. Checked at loop boundaries, not mid-candidate.
#[derive(Clone, Default)]
pub(crate) struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub(crate) fn new() -> CancelToken {
        CancelToken::default()
    }

    pub(crate) fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub(crate) fn checkpoint(&self) -> Result<()> {
        if self.flag.load(Ordering::Relaxed) {
            Err(AnalyzeError::Cancelled)
        } else {
            Ok(())
        }
    }
}
