//! Create-then-poll reconciliation loop
//!
//! ```text
//! Created ──create ok──▶ Polling ──success token──▶ Ready
//!                          │  ▲
//!                          │  └── neutral status, sleep(interval)
//!                          ├──── failure token ───▶ Failed
//!                          └──── attempts spent ──▶ TimedOut
//! ```

use crate::error::{CloudError, Result};
use crate::kind::ResourceKind;
use crate::probe::{ProbeSpec, ProbeTable, Status, Verdict};
use crate::provider::{AccountContext, ResourceApi, ResourceRequest, RetryPolicy, StatusProbe};
use serde_json::Value;
use std::fmt;
use tokio::time::sleep;

/// Terminal result of one create-and-wait run
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A success token was observed. Create-only kinds report 0 attempts
    /// and carry the create response.
    Ready { response: Value, attempts: u32 },

    /// The create call hit a duplicate; nothing was polled
    AlreadyExists,

    /// A failure token was observed
    Failed {
        key: String,
        status: Status,
        attempts: u32,
    },

    /// The attempt budget ran out on neutral statuses
    TimedOut {
        key: String,
        attempts: u32,
        last_status: Option<Status>,
    },
}

/// Successful outcome of [`Reconciler::ensure`]
#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned {
    Ready(Value),
    AlreadyExists,
}

/// Reconciliation state, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Created,
    Polling,
    Ready,
    Failed,
    TimedOut,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollState::Created => write!(f, "created"),
            PollState::Polling => write!(f, "polling"),
            PollState::Ready => write!(f, "ready"),
            PollState::Failed => write!(f, "failed"),
            PollState::TimedOut => write!(f, "timed-out"),
        }
    }
}

impl PollOutcome {
    pub fn state(&self) -> PollState {
        match self {
            PollOutcome::Ready { .. } | PollOutcome::AlreadyExists => PollState::Ready,
            PollOutcome::Failed { .. } => PollState::Failed,
            PollOutcome::TimedOut { .. } => PollState::TimedOut,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == PollState::Ready
    }

    /// Number of describe calls issued
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. }
            | PollOutcome::Failed { attempts, .. }
            | PollOutcome::TimedOut { attempts, .. } => *attempts,
            PollOutcome::AlreadyExists => 0,
        }
    }

    /// Turn failure outcomes into errors naming the resource
    pub fn into_provisioned(self, request: &ResourceRequest) -> Result<Provisioned> {
        match self {
            PollOutcome::Ready { response, .. } => Ok(Provisioned::Ready(response)),
            PollOutcome::AlreadyExists => Ok(Provisioned::AlreadyExists),
            PollOutcome::Failed { key, status, .. } => Err(CloudError::TerminalFailure {
                kind: request.kind(),
                key,
                status,
            }),
            PollOutcome::TimedOut {
                key,
                attempts,
                last_status,
            } => Err(CloudError::Timeout {
                kind: request.kind(),
                key,
                attempts,
                last_status,
            }),
        }
    }
}

/// Issues creation calls and waits for the resources to settle
pub struct Reconciler<A> {
    api: A,
    table: ProbeTable,
    context: AccountContext,
}

impl<A: ResourceApi> Reconciler<A> {
    pub fn new(api: A, context: AccountContext) -> Self {
        Self::with_table(api, ProbeTable::standard(), context)
    }

    pub fn with_table(api: A, table: ProbeTable, context: AccountContext) -> Self {
        Self {
            api,
            table,
            context,
        }
    }

    pub fn with_policy_override(mut self, kind: ResourceKind, policy: RetryPolicy) -> Self {
        self.table.set_policy(kind, policy);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn table(&self) -> &ProbeTable {
        &self.table
    }

    pub fn context(&self) -> &AccountContext {
        &self.context
    }

    pub(crate) fn spec(&self, request: &ResourceRequest) -> Result<&ProbeSpec> {
        self.table.get(request.kind()).ok_or_else(|| {
            CloudError::InvalidConfig(format!("no probe configured for {}", request.kind()))
        })
    }

    /// Create the resource once and poll it with the kind's default policy
    pub async fn create_and_wait(&self, request: &ResourceRequest) -> Result<PollOutcome> {
        let spec = self.spec(request)?;
        self.run(request, spec, spec.policy).await
    }

    /// Same as [`Self::create_and_wait`] with an explicit polling budget
    pub async fn create_and_wait_with(
        &self,
        request: &ResourceRequest,
        policy: RetryPolicy,
    ) -> Result<PollOutcome> {
        let spec = self.spec(request)?;
        self.run(request, spec, policy).await
    }

    /// Create and wait, reporting failed or timed-out resources as errors
    pub async fn ensure(&self, request: &ResourceRequest) -> Result<Provisioned> {
        self.create_and_wait(request)
            .await?
            .into_provisioned(request)
    }

    async fn run(
        &self,
        request: &ResourceRequest,
        spec: &ProbeSpec,
        policy: RetryPolicy,
    ) -> Result<PollOutcome> {
        let kind = request.kind();
        if policy.max_attempts == 0 {
            return Err(CloudError::InvalidConfig(format!(
                "{} polling needs at least one attempt",
                kind
            )));
        }

        let created = match self.api.create(request).await {
            Ok(response) => response,
            Err(CloudError::AlreadyExists(existing)) => {
                tracing::warn!("{} {} already exists, moving on", kind, existing);
                return Ok(PollOutcome::AlreadyExists);
            }
            Err(e) => {
                tracing::error!("Creating {} {} failed: {}", kind, request.display_key(), e);
                return Err(e);
            }
        };
        tracing::debug!(
            state = %PollState::Created,
            "{} {} create call accepted",
            kind,
            request.display_key()
        );

        let Some(read_status) = spec.status else {
            tracing::info!("{} {} created", kind, request.display_key());
            return Ok(PollOutcome::Ready {
                response: created,
                attempts: 0,
            });
        };

        let key = request.resolve_key(&created)?;
        let mut last_status = None;

        for attempt in 1..=policy.max_attempts {
            let probe = StatusProbe::new(request, &key, &self.context);

            let response = match self.api.describe(&probe).await {
                Ok(response) => Some(response),
                Err(CloudError::ResourceNotFound(_)) if spec.pending_when_absent => None,
                Err(e) => return Err(e),
            };

            if let Some(response) = response {
                let status = read_status(&response).map_err(|e| CloudError::MalformedResponse {
                    kind,
                    reason: e.to_string(),
                })?;

                tracing::debug!(
                    state = %PollState::Polling,
                    attempt,
                    max_attempts = policy.max_attempts,
                    "{} {} status: {}",
                    kind,
                    key,
                    status
                );

                match spec.classify(&status) {
                    Verdict::Ready => {
                        tracing::info!("{} {} is ready after {} attempt(s)", kind, key, attempt);
                        return Ok(PollOutcome::Ready {
                            response,
                            attempts: attempt,
                        });
                    }
                    Verdict::Failed => {
                        tracing::error!("{} {} failed with status {}", kind, key, status);
                        return Ok(PollOutcome::Failed {
                            key,
                            status,
                            attempts: attempt,
                        });
                    }
                    Verdict::Pending => last_status = Some(status),
                }
            } else {
                tracing::debug!(
                    state = %PollState::Polling,
                    attempt,
                    "{} {} not visible yet",
                    kind,
                    key
                );
            }

            if attempt < policy.max_attempts {
                sleep(policy.interval).await;
            }
        }

        tracing::error!(
            "{} {} timed out after {} attempts",
            kind,
            key,
            policy.max_attempts
        );
        Ok(PollOutcome::TimedOut {
            key,
            attempts: policy.max_attempts,
            last_status,
        })
    }
}
