use rustyline::error::ReadlineError;
use std::io;
use thiserror::Error;

/// Unified error type for chainchat
#[derive(Error, Debug)]
pub enum ChatError {
    /// The model endpoint answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operator input errors
    #[error("Input error: {0}")]
    Input(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// The model returned something that does not fit the response schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The model asked for a function the registry does not know
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    /// A registered function failed or got arguments it cannot use
    #[error("Function execution error: {0}")]
    FunctionExecution(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ChatError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            ChatError::Api(format!("API returned error status: {}", err))
        } else {
            ChatError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for ChatError {
    fn from(err: serde_yml::Error) -> Self {
        ChatError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<ReadlineError> for ChatError {
    fn from(err: ReadlineError) -> Self {
        ChatError::Input(format!("Line editor error: {}", err))
    }
}
