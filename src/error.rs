use thiserror::Error;

/// Failures of the analysis engine. Both are caller errors; nothing here is
/// worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("window size must be at least 1 (got {0})")]
    InvalidWindow(usize),
    #[error("malformed match record at position {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}
