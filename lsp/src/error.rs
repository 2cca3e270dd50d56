use std::fmt;

/// Failures of the analysis and workspace layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AnalyzeError {
    /// The requested file is unknown or unreadable. Surfaced to the editor
    /// as an empty result, never as a fault.
    NotFound(String),
    /// A line/column position outside the document bounds. The tree and the
    /// position disagree, which is a caller defect.
    MalformedPosition { line: u32, character: u32 },
    /// A token without a syntactic parent. Structurally impossible in a
    /// well-formed tree.
    OrphanToken { offset: usize },
    /// A mutator was handed a stale or foreign snapshot.
    InvalidState(String),
    /// Cooperative abort. No partial results are returned.
    Cancelled,
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzeError::NotFound(what) => write!(f, "not found: {what}"),
            AnalyzeError::MalformedPosition { line, character } => {
                write!(f, "position {line}:{character} is outside the document")
            }
            AnalyzeError::OrphanToken { offset } => {
                write!(f, "token at offset {offset} has no parent node")
            }
            AnalyzeError::InvalidState(why) => write!(f, "invalid state: {why}"),
            AnalyzeError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for AnalyzeError {}

pub(crate) type Result<T> = std::result::Result<T, AnalyzeError>;
