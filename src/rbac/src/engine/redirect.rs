//! Landing path resolution

use super::decision::{LandingDecision, LandingReason};
use crate::policy::PolicyTable;
use crate::types::{Path, RoleSet};
use std::sync::Arc;
use tracing::debug;

/// Picks the canonical landing path for a role set
///
/// A privileged label always lands on root. Otherwise roles are scanned in
/// the identity source's order and the first one with a landing entry wins.
/// An identity with no mapped role lands on root.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    table: Arc<PolicyTable>,
}

impl RedirectResolver {
    pub fn new(table: Arc<PolicyTable>) -> Self {
        Self { table }
    }

    /// Landing path only
    pub fn resolve(&self, roles: &RoleSet) -> Path {
        self.explain(roles).path
    }

    /// Landing path with the rule that fired
    pub fn explain(&self, roles: &RoleSet) -> LandingDecision {
        let root = &self.table.routes().root;

        if let Some(role) = roles.privileged() {
            return LandingDecision {
                path: root.clone(),
                reason: LandingReason::PrivilegedOverride { role: role.clone() },
            };
        }

        for role in roles {
            if let Some(path) = self.table.resolve(role) {
                debug!("Landing on {} via role '{}'", path, role);
                return LandingDecision {
                    path: path.to_string(),
                    reason: LandingReason::FirstMapped { role: role.clone() },
                };
            }
        }

        debug!("No mapped role in {:?}, landing on {}", roles, root);
        LandingDecision {
            path: root.clone(),
            reason: LandingReason::Fallback,
        }
    }

    pub fn table(&self) -> &Arc<PolicyTable> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> RedirectResolver {
        RedirectResolver::new(Arc::new(PolicyTable::builtin()))
    }

    #[test]
    fn test_privileged_lands_on_root() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(&RoleSet::new(["Admin"])), "/");
        assert_eq!(resolver.resolve(&RoleSet::new(["Store", "SuperAdmin"])), "/");
    }

    #[test]
    fn test_first_mapped_role_wins() {
        let resolver = resolver();

        assert_eq!(
            resolver.resolve(&RoleSet::new(["Cutting", "Accounts"])),
            "/cutting/dashboard"
        );
        assert_eq!(
            resolver.resolve(&RoleSet::new(["Accounts", "Cutting"])),
            "/accounts/dashboard"
        );
    }

    #[test]
    fn test_unmapped_roles_skipped() {
        let resolver = resolver();
        let decision = resolver.explain(&RoleSet::new(["Quality", "Merchandiser"]));

        assert_eq!(decision.path, "/merchandising/dashboard");
        assert_eq!(
            decision.reason,
            LandingReason::FirstMapped { role: "Merchandiser".into() }
        );
    }

    #[test]
    fn test_fallback() {
        let resolver = resolver();

        let empty = resolver.explain(&RoleSet::empty());
        assert_eq!(empty.path, "/");
        assert!(empty.reason.is_fallback());

        assert_eq!(resolver.resolve(&RoleSet::new(["Quality"])), "/");
    }
}
