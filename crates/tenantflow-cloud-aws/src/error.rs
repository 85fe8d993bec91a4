//! AWS provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("aws CLI not found. Please install: brew install awscli")]
    AwsNotFound,

    #[error("aws authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service answered with an error code
    #[error("{operation} failed with {code}: {message}")]
    Service {
        operation: String,
        code: String,
        message: String,
    },

    #[error("aws command failed: {0}")]
    CommandFailed(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AwsError {
    /// Error code with any `Exception` suffix removed
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Service { code, .. } => Some(code.trim_end_matches("Exception")),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
