//! Decision counters for observability

use parking_lot::RwLock;

/// Engine counters snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Total number of access checks
    pub total_checks: u64,

    /// Number of allow verdicts
    pub allowed_decisions: u64,

    /// Number of deny verdicts
    pub denied_decisions: u64,

    /// Allow verdicts granted through a privileged label
    pub privileged_overrides: u64,

    /// Landing resolutions
    pub landing_resolutions: u64,

    /// Landing resolutions that fell back to root
    pub landing_fallbacks: u64,

    /// Guard transitions per settled state
    pub guard_unauthenticated: u64,
    pub guard_allowed: u64,
    pub guard_denied: u64,
    pub guard_redirected: u64,
}

impl EngineMetrics {
    /// Fraction of checks that were allowed
    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed_decisions + self.denied_decisions;
        if total == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / total as f64
        }
    }
}

/// Settled guard outcome, as counted by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Unauthenticated,
    Allowed,
    Denied,
    Redirected,
}

/// Metrics collector with Prometheus-compatible export
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: RwLock<EngineMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an access verdict
    pub fn record_decision(&self, allowed: bool, privileged: bool) {
        let mut metrics = self.metrics.write();
        metrics.total_checks += 1;

        if allowed {
            metrics.allowed_decisions += 1;
        } else {
            metrics.denied_decisions += 1;
        }
        if privileged {
            metrics.privileged_overrides += 1;
        }
    }

    /// Record a landing resolution
    pub fn record_landing(&self, fallback: bool) {
        let mut metrics = self.metrics.write();
        metrics.landing_resolutions += 1;
        if fallback {
            metrics.landing_fallbacks += 1;
        }
    }

    /// Record a settled guard transition
    pub fn record_guard(&self, outcome: GuardOutcome) {
        let mut metrics = self.metrics.write();
        match outcome {
            GuardOutcome::Unauthenticated => metrics.guard_unauthenticated += 1,
            GuardOutcome::Allowed => metrics.guard_allowed += 1,
            GuardOutcome::Denied => metrics.guard_denied += 1,
            GuardOutcome::Redirected => metrics.guard_redirected += 1,
        }
    }

    /// Current metrics snapshot
    pub fn get_metrics(&self) -> EngineMetrics {
        self.metrics.read().clone()
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let metrics = self.metrics.read();

        format!(
            r#"# HELP rbac_checks_total Total number of access checks
# TYPE rbac_checks_total counter
rbac_checks_total {}

# HELP rbac_allowed_total Number of allow verdicts
# TYPE rbac_allowed_total counter
rbac_allowed_total {}

# HELP rbac_denied_total Number of deny verdicts
# TYPE rbac_denied_total counter
rbac_denied_total {}

# HELP rbac_privileged_overrides_total Allow verdicts granted by a privileged role
# TYPE rbac_privileged_overrides_total counter
rbac_privileged_overrides_total {}

# HELP rbac_landing_total Landing path resolutions
# TYPE rbac_landing_total counter
rbac_landing_total {}

# HELP rbac_landing_fallback_total Landing resolutions that fell back to root
# TYPE rbac_landing_fallback_total counter
rbac_landing_fallback_total {}

# HELP rbac_guard_transitions_total Settled guard transitions
# TYPE rbac_guard_transitions_total counter
rbac_guard_transitions_total{{state="unauthenticated"}} {}
rbac_guard_transitions_total{{state="allowed"}} {}
rbac_guard_transitions_total{{state="denied"}} {}
rbac_guard_transitions_total{{state="redirected"}} {}
"#,
            metrics.total_checks,
            metrics.allowed_decisions,
            metrics.denied_decisions,
            metrics.privileged_overrides,
            metrics.landing_resolutions,
            metrics.landing_fallbacks,
            metrics.guard_unauthenticated,
            metrics.guard_allowed,
            metrics.guard_denied,
            metrics.guard_redirected,
        )
    }
}
