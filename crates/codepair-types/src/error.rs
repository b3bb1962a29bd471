use thiserror::Error;

use crate::llm::LlmError;

/// Errors from a chat submission cycle.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Rejected input: nothing was appended and the oracle was not called.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The oracle call failed; the log keeps the user turn only.
    #[error("oracle error: {0}")]
    Oracle(#[from] LlmError),

    /// The in-flight response was cancelled before it completed.
    #[error("response cancelled")]
    Cancelled,
}

impl ChatError {
    /// Whether the error left the conversation log untouched.
    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }
}

/// Errors from loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid setting '{key}': {message}")]
    Invalid { key: String, message: String },
}
