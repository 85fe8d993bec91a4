//! Resource API trait and the values passed across it

use crate::error::{CloudError, Result};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Remote resource-management API
///
/// Implementations issue the raw create and describe calls. They must map a
/// duplicate-create conflict to [`CloudError::AlreadyExists`] and a missing
/// resource on describe to [`CloudError::ResourceNotFound`]; everything else
/// is reported as-is and never retried by the reconciler.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Returns the provider name (e.g., "aws-cli")
    fn name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Issue the creation call for a request
    async fn create(&self, request: &ResourceRequest) -> Result<Value>;

    /// Describe the resource a probe points at
    async fn describe(&self, probe: &StatusProbe) -> Result<Value>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Account-level values shared by every request of a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    pub account_id: String,
    pub region: String,
    pub admin_id: Option<String>,
}

impl AccountContext {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            admin_id: None,
        }
    }

    pub fn with_admin(mut self, admin_id: impl Into<String>) -> Self {
        self.admin_id = Some(admin_id.into());
        self
    }

    /// QuickSight ARN of the admin user in the default namespace
    pub fn admin_arn(&self) -> Option<String> {
        self.admin_id.as_ref().map(|admin| {
            format!(
                "arn:aws:quicksight:{}:{}:user/default/{}",
                self.region, self.account_id, admin
            )
        })
    }
}

/// A single creation request
///
/// The payload is opaque; only the kind's key field is read from it.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRequest {
    kind: ResourceKind,
    params: Value,
    identifying_key: Option<String>,
}

impl ResourceRequest {
    pub fn new(kind: ResourceKind, params: Value) -> Self {
        let identifying_key = kind
            .key_field()
            .and_then(|field| params.get(field))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            kind,
            params,
            identifying_key,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Key known before creation, if the kind takes one in its payload
    pub fn identifying_key(&self) -> Option<&str> {
        self.identifying_key.as_deref()
    }

    /// Key used in logs and errors
    pub fn display_key(&self) -> &str {
        self.identifying_key.as_deref().unwrap_or("<pending>")
    }

    /// Resolve the key to poll with, falling back to the create response
    pub fn resolve_key(&self, created: &Value) -> Result<String> {
        if let Some(key) = &self.identifying_key {
            return Ok(key.clone());
        }

        let field = self.kind.response_key_field().or(self.kind.key_field());
        field
            .and_then(|f| created.get(f))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CloudError::MalformedResponse {
                kind: self.kind,
                reason: format!(
                    "no identifying key (expected field {})",
                    field.unwrap_or("<none>")
                ),
            })
    }
}

/// Parameters for one describe call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusProbe {
    pub kind: ResourceKind,
    pub key: String,
    pub params: Value,
}

impl StatusProbe {
    pub fn new(request: &ResourceRequest, key: &str, context: &AccountContext) -> Self {
        let kind = request.kind();
        let mut params = Map::new();

        if kind.is_account_scoped() {
            let account = request
                .params()
                .get("AwsAccountId")
                .cloned()
                .unwrap_or_else(|| Value::String(context.account_id.clone()));
            params.insert("AwsAccountId".to_string(), account);
        }

        if let Some(field) = kind.response_key_field().or(kind.key_field()) {
            params.insert(field.to_string(), Value::String(key.to_string()));
        }

        Self {
            kind,
            key: key.to_string(),
            params: Value::Object(params),
        }
    }
}

/// Fixed-interval polling budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between two describe calls
    pub interval: Duration,

    /// Maximum number of describe calls
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const QUICKSIGHT: RetryPolicy = RetryPolicy::fixed(5000, 20);
    pub const ATHENA_QUERY: RetryPolicy = RetryPolicy::fixed(5000, 100);
    pub const IAM_ROLE: RetryPolicy = RetryPolicy::fixed(2000, 10);

    const fn fixed(interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            max_attempts,
        }
    }

    pub fn new(interval: Duration, max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(CloudError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            interval,
            max_attempts,
        })
    }

    pub fn from_millis(interval_ms: u64, max_attempts: u32) -> Result<Self> {
        Self::new(Duration::from_millis(interval_ms), max_attempts)
    }

    /// Apply optional overrides on top of this policy
    pub fn overridden(&self, interval_ms: Option<u64>, max_attempts: Option<u32>) -> Result<Self> {
        Self::new(
            interval_ms.map(Duration::from_millis).unwrap_or(self.interval),
            max_attempts.unwrap_or(self.max_attempts),
        )
    }

    /// Upper bound of time spent sleeping between attempts
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}
