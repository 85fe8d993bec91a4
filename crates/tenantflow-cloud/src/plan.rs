//! Ordered provisioning plans
//!
//! A plan is a list of creation requests applied one after another, e.g. a
//! tenant's namespace, user, template, analysis and dashboard. Later steps
//! usually reference earlier ones, so the first failing step halts the plan.

use crate::error::{CloudError, Result};
use crate::kind::ResourceKind;
use crate::provider::{ResourceApi, ResourceRequest};
use crate::reconcile::{PollOutcome, Provisioned, Reconciler};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// One step of a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Step identifier, defaults to `<kind>:<key>`
    #[serde(default)]
    pub id: Option<String>,

    pub kind: ResourceKind,

    /// Create payload, passed through untouched
    #[serde(default)]
    pub params: serde_json::Value,

    /// Override of the kind's polling interval
    #[serde(default)]
    pub interval_ms: Option<u64>,

    /// Override of the kind's attempt budget
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl PlanStep {
    pub fn new(kind: ResourceKind, params: serde_json::Value) -> Self {
        Self {
            id: None,
            kind,
            params,
            interval_ms: None,
            max_attempts: None,
        }
    }

    pub fn request(&self) -> ResourceRequest {
        ResourceRequest::new(self.kind, self.params.clone())
    }

    pub fn step_id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}:{}", self.kind, self.request().display_key()),
        }
    }
}

/// Plan containing all steps to be applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionPlan {
    pub steps: Vec<PlanStep>,
}

impl ProvisionPlan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CloudError::InvalidConfig(format!("invalid plan: {}", e)))
    }

    /// Load a plan file; `.json` is read as JSON, anything else as YAML
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;

        let plan = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_yaml_str(&content)?,
        };

        tracing::debug!("Loaded plan with {} steps from {}", plan.steps.len(), path.display());
        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Result of applying a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied steps
    pub succeeded: Vec<StepResult>,

    /// Failed steps (at most one, the plan halts on it)
    pub failed: Vec<StepResult>,

    /// Steps never started because an earlier one failed
    pub skipped: Vec<String>,

    pub started_at: DateTime<Utc>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, step_id: String, message: String, attempts: u32) {
        self.succeeded.push(StepResult {
            step_id,
            success: true,
            message,
            attempts,
            error: None,
        });
    }

    pub fn add_failure(&mut self, step_id: String, error: String, attempts: u32) {
        self.failed.push(StepResult {
            step_id,
            success: false,
            message: String::new(),
            attempts,
            error: Some(error),
        });
    }

    pub fn summary(&self) -> ApplySummary {
        ApplySummary {
            succeeded: self.succeeded.len(),
            failed: self.failed.len(),
            skipped: self.skipped.len(),
        }
    }
}

impl Default for ApplyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub success: bool,
    pub message: String,
    /// Describe calls issued for the step
    pub attempts: u32,
    pub error: Option<String>,
}

/// Summary of an applied plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplySummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl std::fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )
    }
}

impl<A: ResourceApi> Reconciler<A> {
    /// Apply every step in order, halting at the first failure
    pub async fn apply(&self, plan: &ProvisionPlan) -> ApplyResult {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();
        let mut steps = plan.steps.iter();

        for step in steps.by_ref() {
            let step_id = step.step_id();
            tracing::info!("Applying {}", step_id);

            match self.apply_step(step).await {
                Ok(outcome) => {
                    let attempts = outcome.attempts();
                    match outcome.into_provisioned(&step.request()) {
                        Ok(Provisioned::AlreadyExists) => {
                            result.add_success(step_id, "already exists".to_string(), attempts);
                        }
                        Ok(Provisioned::Ready(_)) => {
                            result.add_success(step_id, "ready".to_string(), attempts);
                        }
                        Err(e) => {
                            result.add_failure(step_id, e.to_string(), attempts);
                            break;
                        }
                    }
                }
                Err(e) => {
                    result.add_failure(step_id, e.to_string(), 0);
                    break;
                }
            }
        }

        result.skipped = steps.map(PlanStep::step_id).collect();
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    async fn apply_step(&self, step: &PlanStep) -> Result<PollOutcome> {
        let request = step.request();
        let policy = self
            .spec(&request)?
            .policy
            .overridden(step.interval_ms, step.max_attempts)?;
        self.create_and_wait_with(&request, policy).await
    }
}
