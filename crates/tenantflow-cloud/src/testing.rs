//! Scripted [`ResourceApi`] for unit tests

use crate::error::Result;
use crate::kind::ResourceKind;
use crate::provider::{AuthStatus, ResourceApi, ResourceRequest, StatusProbe};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create(ResourceKind, String),
    Describe(ResourceKind, String),
}

/// Replays canned results keyed by identifying key.
///
/// Creates without a script answer `{}`. A describe past the end of its
/// script panics, so tests fail loudly on extra polls.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    calls: Mutex<Vec<Call>>,
    creates: Mutex<HashMap<String, Result<Value>>>,
    describes: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_create(self, key: &str, result: Result<Value>) -> Self {
        self.creates.lock().unwrap().insert(key.to_string(), result);
        self
    }

    pub(crate) fn on_describe(self, key: &str, results: Vec<Result<Value>>) -> Self {
        self.describes
            .lock()
            .unwrap()
            .insert(key.to_string(), results.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn describe_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Describe(..)))
            .count()
    }
}

#[async_trait]
impl ResourceApi for ScriptedApi {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok("scripted"))
    }

    async fn create(&self, request: &ResourceRequest) -> Result<Value> {
        let key = request.display_key().to_string();
        self.calls
            .lock()
            .unwrap()
            .push(Call::Create(request.kind(), key.clone()));

        self.creates
            .lock()
            .unwrap()
            .remove(&key)
            .unwrap_or_else(|| Ok(json!({})))
    }

    async fn describe(&self, probe: &StatusProbe) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Describe(probe.kind, probe.key.clone()));

        self.describes
            .lock()
            .unwrap()
            .get_mut(&probe.key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("unexpected describe for {} {}", probe.kind, probe.key))
    }
}
