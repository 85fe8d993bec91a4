//! Provisioning error types

use crate::kind::ResourceKind;
use crate::probe::Status;
use thiserror::Error;

/// Errors surfaced by resource APIs and the reconciliation loop
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Duplicate-create conflict. The poller treats this as success.
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Creation of {kind} '{key}' was rejected: {reason}")]
    CreationRejected {
        kind: ResourceKind,
        key: String,
        reason: String,
    },

    #[error("{kind} '{key}' reached failure status {status}")]
    TerminalFailure {
        kind: ResourceKind,
        key: String,
        status: Status,
    },

    #[error(
        "{kind} '{key}' was not ready after {attempts} attempts (last status: {})",
        last_status_label(.last_status)
    )]
    Timeout {
        kind: ResourceKind,
        key: String,
        attempts: u32,
        last_status: Option<Status>,
    },

    #[error("API error: {0}")]
    Transport(String),

    #[error("Unexpected {kind} response: {reason}")]
    MalformedResponse { kind: ResourceKind, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn last_status_label(status: &Option<Status>) -> String {
    status
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_last_status() {
        let err = CloudError::Timeout {
            kind: ResourceKind::Dashboard,
            key: "acme-dashboard".to_string(),
            attempts: 20,
            last_status: Some(Status::Text("CREATION_IN_PROGRESS".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "dashboard 'acme-dashboard' was not ready after 20 attempts (last status: CREATION_IN_PROGRESS)"
        );

        let err = CloudError::Timeout {
            kind: ResourceKind::IamRole,
            key: "acmeTenantRole".to_string(),
            attempts: 10,
            last_status: None,
        };
        assert!(err.to_string().ends_with("(last status: none)"));
    }
}
