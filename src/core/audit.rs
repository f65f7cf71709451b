//! Audit events.
//!
//! Persistence of the audit log lives outside this crate; the engine only
//! writes events to an [`AuditSink`].

use std::sync::Mutex;

use serde_json::Value;
use tracing::info;

use crate::core::domain::UserId;

/// Log target audit events are emitted on.
pub const AUDIT_TARGET: &str = "native_form::audit";

/// What an audit event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTarget {
    pub kind: &'static str,
    pub id: Option<String>,
}

impl AuditTarget {
    pub fn connection(id: impl ToString) -> Self {
        Self {
            kind: "cloud_connection",
            id: Some(id.to_string()),
        }
    }

    pub fn resource(id: impl ToString) -> Self {
        Self {
            kind: "cached_resource",
            id: Some(id.to_string()),
        }
    }

    /// An action over a whole result set.
    pub fn none() -> Self {
        Self { kind: "none", id: None }
    }
}

/// Write-only consumer of audit events.
pub trait AuditSink: Send + Sync {
    fn record_event(&self, actor: &UserId, action: &str, target: &AuditTarget, details: Value);
}

/// Emits audit events as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record_event(&self, actor: &UserId, action: &str, target: &AuditTarget, details: Value) {
        info!(
            target: AUDIT_TARGET,
            actor = %actor,
            action,
            target_type = target.kind,
            target_id = target.id.as_deref().unwrap_or("-"),
            details = %details,
            "audit"
        );
    }
}

/// One event captured by [`RecordingAudit`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub actor: UserId,
    pub action: String,
    pub target: AuditTarget,
    pub details: Value,
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.action).collect()
    }
}

impl AuditSink for RecordingAudit {
    fn record_event(&self, actor: &UserId, action: &str, target: &AuditTarget, details: Value) {
        if let Ok(mut events) = self.events.lock() {
            events.push(AuditEvent {
                actor: actor.clone(),
                action: action.to_string(),
                target: target.clone(),
                details,
            });
        }
    }
}
