//! Core RBAC types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Landing or navigation path (e.g., "/store/dashboard")
pub type Path = String;

/// Root landing path
pub const ROOT_PATH: &str = "/";

/// Labels that bypass every other check
pub const PRIVILEGED_ROLES: [&str; 2] = ["SuperAdmin", "Admin"];

/// Role label held by an identity (e.g., "Admin", "StoreKeeper")
///
/// Compared by exact, case-sensitive match. No normalization is applied:
/// "admin" and "Admin" are different labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleLabel(String);

impl RoleLabel {
    /// Create a new role label
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this label is one of the privileged overrides
    pub fn is_privileged(&self) -> bool {
        PRIVILEGED_ROLES.contains(&self.0.as_str())
    }
}

impl fmt::Display for RoleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for RoleLabel {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Role labels held by one identity at evaluation time
///
/// Iteration order is the identity source's order and is preserved: it is
/// what decides the landing path for identities holding several mapped roles.
/// Built fresh from every identity snapshot and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<RoleLabel>);

impl RoleSet {
    /// Create a role set, keeping the given order
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleLabel>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    /// Empty role set
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Roles in identity-source order
    pub fn iter(&self) -> impl Iterator<Item = &RoleLabel> {
        self.0.iter()
    }

    /// Exact-match membership test
    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|r| r.as_str() == role)
    }

    /// First privileged label, if any
    pub fn privileged(&self) -> Option<&RoleLabel> {
        self.0.iter().find(|r| r.is_privileged())
    }

    /// First role (in order) that is also in `required`
    pub fn first_shared(&self, required: &RequiredRoleSet) -> Option<&RoleLabel> {
        self.0.iter().find(|r| required.contains(r.as_str()))
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a RoleLabel;
    type IntoIter = std::slice::Iter<'a, RoleLabel>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Roles a protected resource accepts (any one is enough)
///
/// An empty set means "no restriction beyond being authenticated".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredRoleSet(Vec<RoleLabel>);

impl RequiredRoleSet {
    /// Create a required-role set; duplicates are dropped
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleLabel>,
    {
        let mut labels: Vec<RoleLabel> = Vec::new();
        for role in roles {
            let role = role.into();
            if !labels.contains(&role) {
                labels.push(role);
            }
        }
        Self(labels)
    }

    /// No restriction
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|r| r.as_str() == role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleLabel> {
        self.0.iter()
    }
}

/// Access verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Allow => f.write_str("allow"),
            Verdict::Deny => f.write_str("deny"),
        }
    }
}
