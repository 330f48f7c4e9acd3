//! Decision engine
//!
//! Bundles the pure evaluator and resolver with an injected policy table, and
//! records metrics and audit entries around them.

pub mod access;
pub mod decision;
pub mod metrics;
pub mod redirect;

pub use access::AccessEvaluator;
pub use decision::{AccessDecision, DecisionReason, LandingDecision, LandingReason};
pub use metrics::{EngineMetrics, GuardOutcome, MetricsCollector};
pub use redirect::RedirectResolver;

use crate::audit::AuditLog;
use crate::error::{RbacError, Result};
use crate::guard::GuardOrchestrator;
use crate::policy::PolicyTable;
use crate::types::{RequiredRoleSet, RoleSet};

use std::sync::Arc;
use tracing::{debug, info};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Enable the in-memory audit trail
    pub enable_audit: bool,

    /// Maximum audit entries kept
    pub audit_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            enable_audit: true,
            audit_capacity: 10_000,
        }
    }
}

/// RBAC decision engine
///
/// # Architecture
///
/// ```text
/// RoleSet ─┬─▶ AccessEvaluator ──▶ AccessDecision
///          └─▶ RedirectResolver ─▶ LandingDecision
///                    ▲
///               PolicyTable
///                    │
///            GuardOrchestrator (one per protected boundary)
/// ```
#[derive(Debug)]
pub struct RbacEngine {
    table: Arc<PolicyTable>,
    evaluator: AccessEvaluator,
    resolver: RedirectResolver,
    metrics: Option<Arc<MetricsCollector>>,
    audit: Option<Arc<AuditLog>>,
}

impl RbacEngine {
    /// Engine over the builtin table with default configuration
    pub fn new() -> Self {
        Self::with_config(Arc::new(PolicyTable::builtin()), EngineConfig::default())
    }

    /// Engine over the given table
    pub fn with_config(table: Arc<PolicyTable>, config: EngineConfig) -> Self {
        let metrics = config
            .enable_metrics
            .then(|| Arc::new(MetricsCollector::new()));
        let audit = config
            .enable_audit
            .then(|| Arc::new(AuditLog::new(config.audit_capacity)));

        info!(
            "RbacEngine initialized with {} landing entries, {} sections, metrics={}, audit={}",
            table.landing_entries().len(),
            table.sections().len(),
            config.enable_metrics,
            config.enable_audit
        );

        Self {
            resolver: RedirectResolver::new(Arc::clone(&table)),
            table,
            evaluator: AccessEvaluator::new(),
            metrics,
            audit,
        }
    }

    /// Check roles against an explicit required set
    pub fn check(&self, roles: &RoleSet, required: &RequiredRoleSet) -> AccessDecision {
        let decision = self.evaluator.explain(roles, required);
        let subject = required
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join("|");
        self.finalize_access(&subject, &decision);
        decision
    }

    /// Check roles against a named section
    pub fn check_section(&self, roles: &RoleSet, section: &str) -> Result<AccessDecision> {
        let required = self
            .table
            .required_roles(section)
            .ok_or_else(|| RbacError::SectionNotFound(section.to_string()))?;

        debug!("Checking section '{}' for roles {:?}", section, roles);
        let decision = self.evaluator.explain(roles, required);
        self.finalize_access(section, &decision);
        Ok(decision)
    }

    /// Canonical landing path for roles
    pub fn landing(&self, roles: &RoleSet) -> LandingDecision {
        let decision = self.resolver.explain(roles);

        if let Some(metrics) = &self.metrics {
            metrics.record_landing(decision.reason.is_fallback());
        }
        if let Some(audit) = &self.audit {
            audit.record_landing(roles, &decision);
        }

        decision
    }

    /// Guard for a named section, using the section's deny path
    pub fn guard_for_section(&self, section: &str) -> Result<GuardOrchestrator> {
        let spec = self
            .table
            .section(section)
            .ok_or_else(|| RbacError::SectionNotFound(section.to_string()))?;

        let guard = GuardOrchestrator::section(
            spec.name.clone(),
            spec.required.clone(),
            Arc::clone(&self.table),
        )
        .with_deny_path(self.table.deny_path(spec));

        Ok(self.instrument(guard))
    }

    /// Guard for the post-login landing route
    pub fn landing_guard(&self) -> GuardOrchestrator {
        self.instrument(GuardOrchestrator::landing(Arc::clone(&self.table)))
    }

    pub fn table(&self) -> &Arc<PolicyTable> {
        &self.table
    }

    /// Get engine metrics
    pub fn get_metrics(&self) -> Option<EngineMetrics> {
        self.metrics.as_ref().map(|m| m.get_metrics())
    }

    pub fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }

    pub fn audit(&self) -> Option<&Arc<AuditLog>> {
        self.audit.as_ref()
    }

    fn instrument(&self, mut guard: GuardOrchestrator) -> GuardOrchestrator {
        if let Some(metrics) = &self.metrics {
            guard = guard.with_metrics(Arc::clone(metrics));
        }
        if let Some(audit) = &self.audit {
            guard = guard.with_audit(Arc::clone(audit));
        }
        guard
    }

    fn finalize_access(&self, subject: &str, decision: &AccessDecision) {
        if let Some(metrics) = &self.metrics {
            let privileged = matches!(decision.reason, DecisionReason::PrivilegedOverride { .. });
            metrics.record_decision(decision.allowed(), privileged);
        }
        if let Some(audit) = &self.audit {
            audit.record_access(subject, decision);
        }
    }
}

impl Default for RbacEngine {
    fn default() -> Self {
        Self::new()
    }
}
