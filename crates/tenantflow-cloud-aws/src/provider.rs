//! AWS provider implementation

use crate::awscli::AwsCli;
use crate::error::AwsError;
use async_trait::async_trait;
use serde_json::Value;
use tenantflow_cloud::{AuthStatus, CloudError, ResourceApi, ResourceRequest, StatusProbe};

/// Codes signalling a duplicate create, compared without the `Exception` suffix
const ALREADY_EXISTS_CODES: &[&str] = &["ResourceExists", "Conflict", "EntityAlreadyExists"];

const NOT_FOUND_CODES: &[&str] = &["ResourceNotFound", "NoSuchEntity"];

/// Codes that say nothing about the request itself
const TRANSIENT_CODES: &[&str] = &[
    "Throttling",
    "TooManyRequests",
    "ServiceUnavailable",
    "InternalFailure",
    "InternalServer",
    "InternalServerError",
    "RequestTimeout",
];

/// AWS provider backed by the aws CLI
pub struct AwsResourceApi {
    cli: AwsCli,
}

impl AwsResourceApi {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            cli: AwsCli::new(Some(region.into())),
        }
    }

    pub fn with_cli(cli: AwsCli) -> Self {
        Self { cli }
    }
}

/// Map a failed create call onto the reconciler's taxonomy
pub(crate) fn create_error(request: &ResourceRequest, err: AwsError) -> CloudError {
    match err.code() {
        Some(code) if ALREADY_EXISTS_CODES.contains(&code) => {
            CloudError::AlreadyExists(request.display_key().to_string())
        }
        Some(code) if TRANSIENT_CODES.contains(&code) => CloudError::Transport(err.to_string()),
        Some(_) => CloudError::CreationRejected {
            kind: request.kind(),
            key: request.display_key().to_string(),
            reason: err.to_string(),
        },
        None => transport_error(err),
    }
}

/// Map a failed describe call onto the reconciler's taxonomy
pub(crate) fn describe_error(probe: &StatusProbe, err: AwsError) -> CloudError {
    match err.code() {
        Some(code) if NOT_FOUND_CODES.contains(&code) => {
            CloudError::ResourceNotFound(format!("{} {}", probe.kind, probe.key))
        }
        _ => transport_error(err),
    }
}

fn transport_error(err: AwsError) -> CloudError {
    match err {
        AwsError::AwsNotFound => CloudError::ProviderNotFound(err.to_string()),
        other => CloudError::Transport(other.to_string()),
    }
}

#[async_trait]
impl ResourceApi for AwsResourceApi {
    fn name(&self) -> &str {
        "aws-cli"
    }

    async fn check_auth(&self) -> tenantflow_cloud::Result<AuthStatus> {
        match self.cli.check_auth().await {
            Ok(identity) => Ok(AuthStatus::ok(format!(
                "{} ({})",
                identity.arn, identity.account
            ))),
            Err(AwsError::AwsNotFound) => Ok(AuthStatus::failed("aws CLI is not installed")),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn create(&self, request: &ResourceRequest) -> tenantflow_cloud::Result<Value> {
        let operation = request.kind().operation();
        tracing::info!(
            "Creating {} {} via {} {}",
            request.kind(),
            request.display_key(),
            operation.service,
            operation.create
        );

        self.cli
            .call(operation.service, operation.create, request.params())
            .await
            .map_err(|e| create_error(request, e))
    }

    async fn describe(&self, probe: &StatusProbe) -> tenantflow_cloud::Result<Value> {
        let operation = probe.kind.operation();
        let describe = operation.describe.ok_or_else(|| {
            CloudError::InvalidConfig(format!("{} has no describe operation", probe.kind))
        })?;

        self.cli
            .call(operation.service, describe, &probe.params)
            .await
            .map_err(|e| describe_error(probe, e))
    }
}
