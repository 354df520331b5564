// authorizer.rs - Request-time facade used by the gateway.
//
// The transport only ever learns `allow`. Deny reasons go to the server-side
// log and, on request, into a DecisionRecord for internal audit; they are
// never meant for the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{DecisionEngine, DenyReason};
use crate::input::DecisionInput;
use crate::rate_limit::{NoUsageCounter, UsageCounter};
use crate::snapshot::{PolicySnapshot, SnapshotStore};

/// Internal audit record of one decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub record_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Snapshot generation the decision was made against.
    pub generation: u64,
    pub subject: String,
    pub component: Option<String>,
    pub method: Option<String>,
    pub tool: Option<String>,
    pub allow: bool,
    pub deny_reasons: Vec<DenyReason>,
}

/// Decides requests against the current snapshot.
pub struct Authorizer<C = NoUsageCounter> {
    store: Arc<SnapshotStore>,
    engine: DecisionEngine<C>,
}

impl Authorizer {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self {
            store,
            engine: DecisionEngine::new(),
        }
    }
}

impl<C: UsageCounter> Authorizer<C> {
    pub fn with_engine(store: Arc<SnapshotStore>, engine: DecisionEngine<C>) -> Self {
        Self { store, engine }
    }

    /// The snapshot store, for hot reloads.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Decide one request. Only the verdict leaves this function.
    pub fn authorize(&self, input: &DecisionInput) -> bool {
        self.authorize_with_record(input).allow
    }

    /// Decide one request and return the full internal record.
    pub fn authorize_with_record(&self, input: &DecisionInput) -> DecisionRecord {
        let snapshot = self.store.current();
        let record = self.decide_on(&snapshot, input);

        if record.allow {
            tracing::debug!(
                generation = record.generation,
                subject = %record.subject,
                component = record.component.as_deref().unwrap_or("-"),
                tool = record.tool.as_deref().unwrap_or("-"),
                "request allowed"
            );
        } else {
            let reasons: Vec<&str> = record.deny_reasons.iter().map(DenyReason::as_str).collect();
            tracing::info!(
                record_id = %record.record_id,
                generation = record.generation,
                subject = %record.subject,
                component = record.component.as_deref().unwrap_or("-"),
                method = record.method.as_deref().unwrap_or("-"),
                tool = record.tool.as_deref().unwrap_or("-"),
                reasons = ?reasons,
                "request denied"
            );
        }
        record
    }

    fn decide_on(&self, snapshot: &PolicySnapshot, input: &DecisionInput) -> DecisionRecord {
        let decision = self.engine.decide(
            snapshot.artifact(),
            snapshot.mode(),
            snapshot.tables(),
            input,
        );
        DecisionRecord {
            record_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            generation: snapshot.generation(),
            subject: input.token.sub.clone(),
            component: input.request.component().map(str::to_string),
            method: input.mcp.as_ref().map(|m| m.method.clone()),
            tool: input.mcp.as_ref().and_then(|m| m.called_tool()).map(str::to_string),
            allow: decision.allow,
            deny_reasons: decision.deny_reasons,
        }
    }
}
