//! Error taxonomy for a single analysis submission.
//!
//! Every variant is terminal for the submission that produced it; nothing is retried.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// No municipality was selected. Resolved locally, no request is issued.
    #[error("no municipality selected")]
    Validation,

    /// A submission is already in flight and the policy forbids overlapping ones.
    #[error("an analysis is already in progress")]
    Busy,

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("Error {status}: {reason}")]
    Http { status: u16, reason: String },

    /// The body was not the JSON document we expect.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Well-formed response carrying `success: false`.
    #[error("{}", .0.as_deref().unwrap_or("application error"))]
    Application(Option<String>),
}

impl AnalysisError {
    /// Transport, HTTP and decoding failures share one generic user-facing message.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            AnalysisError::Transport(_) | AnalysisError::Http { .. } | AnalysisError::Malformed(_)
        )
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AnalysisError::Malformed(e.to_string())
        } else {
            AnalysisError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegressionError {
    /// Fewer than two observations: the slope denominator is zero.
    #[error("insufficient data: need at least 2 observations, got {0}")]
    InsufficientData(usize),

    #[error("last observed date could not be parsed")]
    UnparseableDate,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference store I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("preference store format: {0}")]
    Json(#[from] serde_json::Error),
}
