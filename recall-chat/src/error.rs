//! Error types for recall-chat

use thiserror::Error;

/// Result type alias for recall-chat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in recall-chat
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Memory(#[from] recall_memory::Error),

    /// Transport failure or non-success status from the LLM provider
    #[error("LLM error: {0}")]
    Llm(String),

    /// The provider answered but produced no text
    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }
}

impl From<rustyline::error::ReadlineError> for Error {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        Self::Terminal(err.to_string())
    }
}
