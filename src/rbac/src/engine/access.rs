//! Access evaluation for role-gated resources

use super::decision::{AccessDecision, DecisionReason};
use crate::types::{RequiredRoleSet, RoleSet, Verdict};
use tracing::debug;

/// Decides whether a role set may enter a resource
///
/// Rules, first match wins:
///
/// 1. empty required set → allow
/// 2. privileged label held → allow
/// 3. any held role accepted → allow
/// 4. otherwise → deny
///
/// Pure: the same inputs always give the same verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessEvaluator;

impl AccessEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Verdict only
    pub fn evaluate(&self, roles: &RoleSet, required: &RequiredRoleSet) -> Verdict {
        match Self::reason(roles, required) {
            DecisionReason::NoMatchingRole => Verdict::Deny,
            _ => Verdict::Allow,
        }
    }

    /// Verdict with the rule that fired
    pub fn explain(&self, roles: &RoleSet, required: &RequiredRoleSet) -> AccessDecision {
        let reason = Self::reason(roles, required);
        let verdict = match reason {
            DecisionReason::NoMatchingRole => Verdict::Deny,
            _ => Verdict::Allow,
        };

        debug!(
            "Access {} for roles {:?} against {:?}: {}",
            verdict,
            roles,
            required,
            reason.describe()
        );

        AccessDecision::new(verdict, reason, roles.clone())
    }

    fn reason(roles: &RoleSet, required: &RequiredRoleSet) -> DecisionReason {
        if required.is_empty() {
            return DecisionReason::Unrestricted;
        }

        if let Some(role) = roles.privileged() {
            return DecisionReason::PrivilegedOverride { role: role.clone() };
        }

        match roles.first_shared(required) {
            Some(role) => DecisionReason::RoleMatch { role: role.clone() },
            None => DecisionReason::NoMatchingRole,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(roles: &[&str], required: &[&str]) -> Verdict {
        AccessEvaluator::new().evaluate(
            &RoleSet::new(roles.iter().copied()),
            &RequiredRoleSet::new(required.iter().copied()),
        )
    }

    #[test]
    fn test_admin_override() {
        assert_eq!(eval(&["Admin"], &["Store"]), Verdict::Allow);
        assert_eq!(eval(&["SuperAdmin"], &["Accounts", "HR"]), Verdict::Allow);
    }

    #[test]
    fn test_role_intersection() {
        assert_eq!(eval(&["StoreKeeper"], &["Store", "StoreKeeper"]), Verdict::Allow);
        assert_eq!(eval(&["Merchandiser"], &["Admin"]), Verdict::Deny);
    }

    #[test]
    fn test_unrestricted() {
        assert_eq!(eval(&[], &[]), Verdict::Allow);
        assert_eq!(eval(&["Cutting"], &[]), Verdict::Allow);
    }

    #[test]
    fn test_empty_roles_denied_on_gated_resource() {
        assert_eq!(eval(&[], &["Store"]), Verdict::Deny);
    }

    #[test]
    fn test_no_case_folding() {
        assert_eq!(eval(&["admin"], &["Store"]), Verdict::Deny);
        assert_eq!(eval(&["store"], &["Store"]), Verdict::Deny);
    }

    #[test]
    fn test_explain_matches_evaluate() {
        let evaluator = AccessEvaluator::new();
        let roles = RoleSet::new(["Cutting", "Store"]);
        let required = RequiredRoleSet::new(["Store"]);

        let decision = evaluator.explain(&roles, &required);
        assert_eq!(decision.verdict, evaluator.evaluate(&roles, &required));
        assert_eq!(decision.reason, DecisionReason::RoleMatch { role: "Store".into() });
    }
}
