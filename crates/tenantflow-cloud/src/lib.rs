//! tenantflow cloud provisioning
//!
//! This crate waits for asynchronously created cloud resources to settle.
//! A creation call is issued once, then the resource's describe endpoint is
//! polled until its status reaches a success or failure token, or the retry
//! budget runs out.
//!
//! # Supported resource kinds
//!
//! - **QuickSight**: data sources, data sets, namespaces, templates,
//!   analyses, dashboards, users
//! - **Athena**: query executions
//! - **IAM**: roles, inline role policies
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 tenantflow CLI                   │
//! │            (tenantflow create/apply)             │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               tenantflow-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Reconciler::create_and_wait / apply      │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────────────┐    │
//! │  │  ProbeTable  │  │  trait ResourceApi   │    │
//! │  └──────────────┘  └──────────┬───────────┘    │
//! └───────────────────────────────┼────────────────┘
//!                                 │
//!                         ┌───────▼───────┐
//!                         │    aws CLI    │
//!                         │   provider    │
//!                         └───────────────┘
//! ```

pub mod error;
pub mod kind;
pub mod plan;
pub mod probe;
pub mod provider;
pub mod reconcile;

#[cfg(test)]
mod testing;

// Re-exports
pub use error::{CloudError, Result};
pub use kind::{ApiOperation, ResourceKind};
pub use plan::{ApplyResult, ApplySummary, PlanStep, ProvisionPlan, StepResult};
pub use probe::{ProbeSpec, ProbeTable, Status, StatusAccessor, StatusToken, Verdict};
pub use provider::{
    AccountContext, AuthStatus, ResourceApi, ResourceRequest, RetryPolicy, StatusProbe,
};
pub use reconcile::{PollOutcome, PollState, Provisioned, Reconciler};
