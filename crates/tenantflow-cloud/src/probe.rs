//! Status dispatch table
//!
//! Every resource kind maps to a [`ProbeSpec`]: how to read the status out of
//! its describe response, which status values are terminal, and how long to
//! keep polling. Response shapes are known per kind, so each accessor
//! deserializes only the fields leading to the status.

use crate::kind::ResourceKind;
use crate::provider::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Status value observed in a describe response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Status {
    Code(i64),
    Text(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Code(code) => write!(f, "{}", code),
            Status::Text(text) => f.write_str(text),
        }
    }
}

/// Configured status value a [`Status`] is compared against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusToken {
    Code(i64),
    Text(Cow<'static, str>),
}

impl StatusToken {
    pub const fn text(value: &'static str) -> Self {
        StatusToken::Text(Cow::Borrowed(value))
    }

    /// Integers become codes, anything else text
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(code) => StatusToken::Code(code),
            Err(_) => StatusToken::Text(Cow::Owned(trimmed.to_string())),
        }
    }

    pub fn matches(&self, status: &Status) -> bool {
        match (self, status) {
            (StatusToken::Code(expected), Status::Code(actual)) => expected == actual,
            (StatusToken::Text(expected), Status::Text(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusToken::Code(code) => write!(f, "{}", code),
            StatusToken::Text(text) => f.write_str(text),
        }
    }
}

const CREATION_SUCCESSFUL: StatusToken = StatusToken::text("CREATION_SUCCESSFUL");
const CREATION_FAILED: StatusToken = StatusToken::text("CREATION_FAILED");
const CREATED: StatusToken = StatusToken::text("CREATED");
const NON_RETRYABLE_FAILURE: StatusToken = StatusToken::text("NON_RETRYABLE_FAILURE");
const HTTP_OK: StatusToken = StatusToken::Code(200);
const HTTP_BAD_REQUEST: StatusToken = StatusToken::Code(400);
const ROLE_PRESENT: &str = "CREATED";

/// Reads the status out of a describe response
pub type StatusAccessor = fn(&Value) -> serde_json::Result<Status>;

/// How a kind's readiness is checked
#[derive(Debug, Clone)]
pub struct ProbeSpec {
    /// `None` for create-only kinds
    pub status: Option<StatusAccessor>,

    /// Status values meaning the resource is ready
    pub success: Vec<StatusToken>,

    /// Status values meaning creation failed for good
    pub failure: Vec<StatusToken>,

    /// Default polling budget
    pub policy: RetryPolicy,

    /// A not-found describe counts as "still propagating"
    pub pending_when_absent: bool,
}

/// Classification of one observed status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ready,
    Failed,
    Pending,
}

impl ProbeSpec {
    fn polled(
        status: StatusAccessor,
        success: Vec<StatusToken>,
        failure: Vec<StatusToken>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            status: Some(status),
            success,
            failure,
            policy,
            pending_when_absent: false,
        }
    }

    fn create_only() -> Self {
        Self {
            status: None,
            success: Vec::new(),
            failure: Vec::new(),
            policy: RetryPolicy::QUICKSIGHT,
            pending_when_absent: false,
        }
    }

    pub fn is_create_only(&self) -> bool {
        self.status.is_none()
    }

    /// Success tokens are checked before failure tokens
    pub fn classify(&self, status: &Status) -> Verdict {
        if self.success.iter().any(|t| t.matches(status)) {
            Verdict::Ready
        } else if self.failure.iter().any(|t| t.matches(status)) {
            Verdict::Failed
        } else {
            Verdict::Pending
        }
    }
}

/// Dispatch table from resource kind to its [`ProbeSpec`]
#[derive(Debug, Clone)]
pub struct ProbeTable {
    specs: HashMap<ResourceKind, ProbeSpec>,
}

impl ProbeTable {
    /// Table with the default tokens and policies for every kind
    pub fn standard() -> Self {
        let mut specs = HashMap::new();

        specs.insert(
            ResourceKind::DataSource,
            ProbeSpec::polled(
                data_source_status,
                vec![CREATION_SUCCESSFUL, HTTP_OK],
                vec![CREATION_FAILED, HTTP_BAD_REQUEST],
                RetryPolicy::QUICKSIGHT,
            ),
        );
        // DescribeDataSet reports the HTTP status of the describe call itself
        specs.insert(
            ResourceKind::DataSet,
            ProbeSpec::polled(
                data_set_status,
                vec![CREATION_SUCCESSFUL, HTTP_OK],
                vec![CREATION_FAILED, HTTP_BAD_REQUEST],
                RetryPolicy::QUICKSIGHT,
            ),
        );
        specs.insert(
            ResourceKind::Namespace,
            ProbeSpec::polled(
                namespace_status,
                vec![CREATION_SUCCESSFUL, CREATED],
                vec![CREATION_FAILED, NON_RETRYABLE_FAILURE],
                RetryPolicy::QUICKSIGHT,
            ),
        );
        specs.insert(
            ResourceKind::Template,
            ProbeSpec::polled(
                template_status,
                vec![CREATION_SUCCESSFUL, CREATED],
                vec![CREATION_FAILED, NON_RETRYABLE_FAILURE],
                RetryPolicy::QUICKSIGHT,
            ),
        );
        specs.insert(
            ResourceKind::Analysis,
            ProbeSpec::polled(
                analysis_status,
                vec![CREATION_SUCCESSFUL, CREATED],
                vec![CREATION_FAILED, NON_RETRYABLE_FAILURE],
                RetryPolicy::QUICKSIGHT,
            ),
        );
        specs.insert(
            ResourceKind::Dashboard,
            ProbeSpec::polled(
                dashboard_status,
                vec![CREATION_SUCCESSFUL, CREATED],
                vec![CREATION_FAILED, NON_RETRYABLE_FAILURE],
                RetryPolicy::QUICKSIGHT,
            ),
        );
        specs.insert(ResourceKind::User, ProbeSpec::create_only());
        specs.insert(
            ResourceKind::AthenaQuery,
            ProbeSpec::polled(
                query_execution_status,
                vec![StatusToken::text("SUCCEEDED")],
                vec![StatusToken::text("FAILED"), StatusToken::text("CANCELLED")],
                RetryPolicy::ATHENA_QUERY,
            ),
        );
        specs.insert(
            ResourceKind::IamRole,
            ProbeSpec {
                pending_when_absent: true,
                ..ProbeSpec::polled(
                    role_status,
                    vec![StatusToken::text(ROLE_PRESENT)],
                    Vec::new(),
                    RetryPolicy::IAM_ROLE,
                )
            },
        );
        specs.insert(ResourceKind::RolePolicy, ProbeSpec::create_only());

        Self { specs }
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&ProbeSpec> {
        self.specs.get(&kind)
    }

    pub fn set_policy(&mut self, kind: ResourceKind, policy: RetryPolicy) {
        if let Some(spec) = self.specs.get_mut(&kind) {
            spec.policy = policy;
        }
    }

    pub fn with_policy(mut self, kind: ResourceKind, policy: RetryPolicy) -> Self {
        self.set_policy(kind, policy);
        self
    }

    /// Replace the token sets of a kind. Empty vectors leave that set alone.
    pub fn set_tokens(
        &mut self,
        kind: ResourceKind,
        success: Vec<StatusToken>,
        failure: Vec<StatusToken>,
    ) {
        if let Some(spec) = self.specs.get_mut(&kind) {
            if !success.is_empty() {
                spec.success = success;
            }
            if !failure.is_empty() {
                spec.failure = failure;
            }
        }
    }

    pub fn with_tokens(
        mut self,
        kind: ResourceKind,
        success: Vec<StatusToken>,
        failure: Vec<StatusToken>,
    ) -> Self {
        self.set_tokens(kind, success, failure);
        self
    }

    /// Entries in declaration order of [`ResourceKind::ALL`]
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &ProbeSpec)> {
        ResourceKind::ALL
            .into_iter()
            .filter_map(|kind| self.specs.get(&kind).map(|spec| (kind, spec)))
    }
}

impl Default for ProbeTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StatusField {
    status: Status,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Versioned {
    version: StatusField,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDataSource {
    data_source: StatusField,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeNamespace {
    namespace: NamespaceInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NamespaceInfo {
    creation_status: Status,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeTemplate {
    template: Versioned,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeAnalysis {
    analysis: StatusField,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDashboard {
    dashboard: Versioned,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryExecution {
    query_execution: QueryExecution,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecution {
    status: QueryState,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryState {
    state: Status,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetRole {
    role: RoleInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleInfo {
    #[allow(dead_code)]
    arn: String,
}

fn data_source_status(response: &Value) -> serde_json::Result<Status> {
    DescribeDataSource::deserialize(response).map(|r| r.data_source.status)
}

fn data_set_status(response: &Value) -> serde_json::Result<Status> {
    StatusField::deserialize(response).map(|r| r.status)
}

fn namespace_status(response: &Value) -> serde_json::Result<Status> {
    DescribeNamespace::deserialize(response).map(|r| r.namespace.creation_status)
}

fn template_status(response: &Value) -> serde_json::Result<Status> {
    DescribeTemplate::deserialize(response).map(|r| r.template.version.status)
}

fn analysis_status(response: &Value) -> serde_json::Result<Status> {
    DescribeAnalysis::deserialize(response).map(|r| r.analysis.status)
}

fn dashboard_status(response: &Value) -> serde_json::Result<Status> {
    DescribeDashboard::deserialize(response).map(|r| r.dashboard.version.status)
}

fn query_execution_status(response: &Value) -> serde_json::Result<Status> {
    GetQueryExecution::deserialize(response).map(|r| r.query_execution.status.state)
}

/// GetRole has no status field: a role that can be read is ready
fn role_status(response: &Value) -> serde_json::Result<Status> {
    GetRole::deserialize(response).map(|_| Status::Text(ROLE_PRESENT.to_string()))
}
