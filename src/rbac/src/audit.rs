//! In-memory audit trail of decisions and guard transitions
//!
//! Bounded ring buffer: once full, the oldest entry is evicted for each new
//! one. Entries are never persisted.

use crate::engine::decision::{AccessDecision, LandingDecision};
use crate::types::RoleSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// What kind of event an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Access,
    Landing,
    Guard,
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry ID (the decision ID for access entries)
    pub id: String,

    pub kind: AuditKind,

    /// Section name, required set or guard label the event is about
    pub subject: String,

    /// Roles the event was evaluated for
    pub roles: RoleSet,

    /// Verdict, landing path or guard state
    pub outcome: String,

    /// Timestamp (milliseconds since epoch)
    pub timestamp: i64,
}

/// Bounded audit log
#[derive(Debug)]
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    /// Create a log holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    /// Record an access decision
    pub fn record_access(&self, subject: impl Into<String>, decision: &AccessDecision) {
        self.push(AuditEntry {
            id: decision.id.clone(),
            kind: AuditKind::Access,
            subject: subject.into(),
            roles: decision.roles.clone(),
            outcome: decision.verdict.to_string(),
            timestamp: decision.timestamp,
        });
    }

    /// Record a landing resolution
    pub fn record_landing(&self, roles: &RoleSet, decision: &LandingDecision) {
        self.push(AuditEntry {
            id: Uuid::new_v4().to_string(),
            kind: AuditKind::Landing,
            subject: "landing".to_string(),
            roles: roles.clone(),
            outcome: decision.path.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }

    /// Record a settled guard transition
    pub fn record_guard(&self, subject: impl Into<String>, roles: &RoleSet, outcome: impl Into<String>) {
        self.push(AuditEntry {
            id: Uuid::new_v4().to_string(),
            kind: AuditKind::Guard,
            subject: subject.into(),
            roles: roles.clone(),
            outcome: outcome.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }

    fn push(&self, entry: AuditEntry) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent entries, newest last
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
