use std::fmt;

/// Failure at the chat-completions boundary.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 status. Display form is `Error: {status} - {body}`.
    #[error("Error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Api,
    Decode,
}

impl LlmError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::Transport(_) => FailureKind::Transport,
            LlmError::Api { .. } => FailureKind::Api,
            LlmError::Decode(_) => FailureKind::Decode,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport => f.write_str("Network error"),
            FailureKind::Api => f.write_str("API error"),
            FailureKind::Decode => f.write_str("Malformed response"),
        }
    }
}

/// A failed call, flattened so it can live in session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl From<LlmError> for Failure {
    fn from(err: LlmError) -> Self {
        Self {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}
