//! Explained decision records

use crate::types::{Path, RoleLabel, RoleSet, Verdict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access decision with the rule that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Unique decision ID
    pub id: String,

    /// Allow or deny
    pub verdict: Verdict,

    /// Which rule fired
    pub reason: DecisionReason,

    /// Roles the decision was made for
    pub roles: RoleSet,

    /// Decision timestamp (milliseconds since epoch)
    pub timestamp: i64,
}

impl AccessDecision {
    pub fn new(verdict: Verdict, reason: DecisionReason, roles: RoleSet) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            verdict,
            reason,
            roles,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn allowed(&self) -> bool {
        self.verdict.is_allowed()
    }
}

/// Reason for an access decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecisionReason {
    /// Resource declares no required roles
    Unrestricted,

    /// A privileged label bypassed the check
    PrivilegedOverride { role: RoleLabel },

    /// First held role that the resource accepts
    RoleMatch { role: RoleLabel },

    /// No held role is accepted by the resource
    NoMatchingRole,
}

impl DecisionReason {
    /// Human-readable description
    pub fn describe(&self) -> String {
        match self {
            DecisionReason::Unrestricted => "resource has no role restriction".to_string(),
            DecisionReason::PrivilegedOverride { role } => {
                format!("privileged role '{}' overrides the check", role)
            }
            DecisionReason::RoleMatch { role } => format!("role '{}' is accepted", role),
            DecisionReason::NoMatchingRole => "no held role is accepted".to_string(),
        }
    }
}

/// Landing path with the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingDecision {
    pub path: Path,
    pub reason: LandingReason,
}

/// Reason for a landing path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LandingReason {
    /// A privileged label sends the identity to root
    PrivilegedOverride { role: RoleLabel },

    /// First role (in identity order) with a landing entry
    FirstMapped { role: RoleLabel },

    /// No held role has a landing entry
    Fallback,
}

impl LandingReason {
    pub fn is_fallback(&self) -> bool {
        matches!(self, LandingReason::Fallback)
    }
}
