//! Guard orchestration
//!
//! A guard sits in front of one protected boundary (a dashboard section, or
//! the post-login landing route). It waits for the identity source to become
//! ready, asks the evaluator or resolver for a decision and turns it into a
//! single signal for the navigation collaborator.
//!
//! ```text
//! Initializing ──ready, no identity──▶ Unauthenticated  → NavigateTo(login)
//!      │
//!      └──ready, identity──▶ Checking ──allow──▶ Allowed    → RenderChildren
//!                                    ├─deny───▶ Denied     → NavigateTo(deny path)
//!                                    └─landing▶ Redirected → NavigateTo(landing path)
//! ```
//!
//! Every snapshot re-runs the transition from the top. A signal is only
//! emitted when it differs from the last one, and the async driver publishes
//! through a `watch` channel so a newer instruction replaces a stale one.

mod state;

pub use state::{GuardSignal, GuardState, IdentitySnapshot};

use crate::audit::AuditLog;
use crate::engine::metrics::{GuardOutcome, MetricsCollector};
use crate::engine::{AccessEvaluator, RedirectResolver};
use crate::policy::PolicyTable;
use crate::types::{Path, RequiredRoleSet, RoleSet, Verdict};

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// What a guard protects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardMode {
    /// Role-gated section
    Section {
        required: RequiredRoleSet,
        deny_path: Path,
    },
    /// Post-login landing route
    Landing,
}

/// Stateful guard for one protected boundary
#[derive(Debug)]
pub struct GuardOrchestrator {
    name: String,
    mode: GuardMode,
    login_path: Path,
    evaluator: AccessEvaluator,
    resolver: RedirectResolver,
    state: GuardState,
    last_signal: Option<GuardSignal>,
    last_snapshot: Option<IdentitySnapshot>,
    metrics: Option<Arc<MetricsCollector>>,
    audit: Option<Arc<AuditLog>>,
}

impl GuardOrchestrator {
    /// Guard for a section accepting `required` roles
    ///
    /// Denied identities go to the table's unauthorized route unless
    /// overridden with [`with_deny_path`](Self::with_deny_path).
    pub fn section(
        name: impl Into<String>,
        required: RequiredRoleSet,
        table: Arc<PolicyTable>,
    ) -> Self {
        let deny_path = table.routes().unauthorized.clone();
        Self::new(name.into(), GuardMode::Section { required, deny_path }, table)
    }

    /// Guard for the post-login landing route
    pub fn landing(table: Arc<PolicyTable>) -> Self {
        Self::new("landing".to_string(), GuardMode::Landing, table)
    }

    fn new(name: String, mode: GuardMode, table: Arc<PolicyTable>) -> Self {
        Self {
            name,
            mode,
            login_path: table.routes().login.clone(),
            evaluator: AccessEvaluator::new(),
            resolver: RedirectResolver::new(table),
            state: GuardState::Initializing,
            last_signal: None,
            last_snapshot: None,
            metrics: None,
            audit: None,
        }
    }

    /// Override the access-denied destination
    pub fn with_deny_path(mut self, path: impl Into<Path>) -> Self {
        if let GuardMode::Section { deny_path, .. } = &mut self.mode {
            *deny_path = path.into();
        }
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> &GuardMode {
        &self.mode
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Last signal handed to the collaborator
    pub fn last_signal(&self) -> Option<&GuardSignal> {
        self.last_signal.as_ref()
    }

    /// State and signal for a snapshot, without touching the guard
    pub fn transition(&self, snapshot: &IdentitySnapshot) -> (GuardState, GuardSignal) {
        if !snapshot.ready {
            return (GuardState::Initializing, GuardSignal::Loading);
        }

        let Some(roles) = snapshot.identity() else {
            return (
                GuardState::Unauthenticated,
                GuardSignal::navigate(self.login_path.clone()),
            );
        };

        match &self.mode {
            GuardMode::Section { required, deny_path } => {
                match self.evaluator.evaluate(roles, required) {
                    Verdict::Allow => (GuardState::Allowed, GuardSignal::RenderChildren),
                    Verdict::Deny => (GuardState::Denied, GuardSignal::navigate(deny_path.clone())),
                }
            }
            GuardMode::Landing => (
                GuardState::Redirected,
                GuardSignal::NavigateTo(self.resolver.resolve(roles)),
            ),
        }
    }

    /// Feed a new identity snapshot
    ///
    /// Returns the signal to act on, or `None` when the outcome is the same
    /// as the one already emitted.
    pub fn observe(&mut self, snapshot: &IdentitySnapshot) -> Option<GuardSignal> {
        self.last_snapshot = Some(snapshot.clone());
        let previous = self.state;

        if snapshot.ready && snapshot.identity().is_some() {
            self.state = GuardState::Checking;
            debug!("Guard '{}' checking roles {:?}", self.name, snapshot.roles);
        }

        let (state, signal) = self.transition(snapshot);
        self.state = state;

        if self.last_signal.as_ref() == Some(&signal) {
            debug!("Guard '{}' outcome unchanged ({})", self.name, state);
            return None;
        }

        info!(
            "Guard '{}' {} -> {}: {:?}",
            self.name, previous, state, signal
        );
        self.record(state, snapshot);
        self.last_signal = Some(signal.clone());

        Some(signal)
    }

    /// Replace the section's required roles and re-evaluate
    ///
    /// Landing guards have no required set; the call is a no-op for them.
    pub fn set_required(&mut self, required: RequiredRoleSet) -> Option<GuardSignal> {
        match &mut self.mode {
            GuardMode::Section { required: current, .. } => {
                if *current == required {
                    return None;
                }
                *current = required;
            }
            GuardMode::Landing => {
                debug!("Guard '{}' is a landing guard, ignoring required roles", self.name);
                return None;
            }
        }

        let snapshot = self.last_snapshot.clone()?;
        self.observe(&snapshot)
    }

    /// Drive the guard from an identity source until it is dropped
    ///
    /// Signals are published with `send_replace`, so a receiver only ever
    /// sees the latest instruction.
    pub async fn run(
        &mut self,
        mut identity: watch::Receiver<IdentitySnapshot>,
        signals: watch::Sender<GuardSignal>,
    ) {
        loop {
            let snapshot = identity.borrow_and_update().clone();
            if let Some(signal) = self.observe(&snapshot) {
                signals.send_replace(signal);
            }

            if identity.changed().await.is_err() {
                debug!("Guard '{}' identity source closed", self.name);
                break;
            }
        }
    }

    /// Run the guard on its own task
    ///
    /// The task finishes (handing the guard back) once every identity sender
    /// is dropped.
    pub fn spawn(
        mut self,
        identity: watch::Receiver<IdentitySnapshot>,
    ) -> (JoinHandle<GuardOrchestrator>, watch::Receiver<GuardSignal>) {
        let (tx, rx) = watch::channel(GuardSignal::Loading);
        let handle = tokio::spawn(async move {
            self.run(identity, tx).await;
            self
        });
        (handle, rx)
    }

    fn record(&self, state: GuardState, snapshot: &IdentitySnapshot) {
        let outcome = match state {
            GuardState::Unauthenticated => GuardOutcome::Unauthenticated,
            GuardState::Allowed => GuardOutcome::Allowed,
            GuardState::Denied => GuardOutcome::Denied,
            GuardState::Redirected => GuardOutcome::Redirected,
            GuardState::Initializing | GuardState::Checking => return,
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_guard(outcome);
        }

        if let Some(audit) = &self.audit {
            let roles = snapshot.roles.clone().unwrap_or_else(RoleSet::empty);
            audit.record_guard(self.name.clone(), &roles, state.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn table() -> Arc<PolicyTable> {
        Arc::new(PolicyTable::builtin())
    }

    fn store_guard() -> GuardOrchestrator {
        GuardOrchestrator::section("store", RequiredRoleSet::new(["Store", "StoreKeeper"]), table())
    }

    #[test]
    fn test_loading_emits_no_verdict() {
        let mut guard = store_guard();

        assert_eq!(guard.observe(&IdentitySnapshot::loading()), Some(GuardSignal::Loading));
        assert_eq!(guard.state(), GuardState::Initializing);
        assert_eq!(guard.observe(&IdentitySnapshot::loading()), None);
    }

    #[test]
    fn test_unauthenticated_goes_to_login() {
        let mut guard = store_guard();

        let signal = guard.observe(&IdentitySnapshot::anonymous());
        assert_eq!(signal, Some(GuardSignal::navigate("/login")));
        assert_eq!(guard.state(), GuardState::Unauthenticated);
    }

    #[test]
    fn test_allowed_then_denied() {
        let mut guard = store_guard();

        let signal = guard.observe(&IdentitySnapshot::authenticated(RoleSet::new(["StoreKeeper"])));
        assert_eq!(signal, Some(GuardSignal::RenderChildren));
        assert_eq!(guard.state(), GuardState::Allowed);

        let signal = guard.observe(&IdentitySnapshot::authenticated(RoleSet::new(["Cutting"])));
        assert_eq!(signal, Some(GuardSignal::navigate("/unauthorized")));
        assert_eq!(guard.state(), GuardState::Denied);
    }

    #[test]
    #[traced_test]
    fn test_transition_logged_from_settled_state() {
        let mut guard = store_guard();
        guard.observe(&IdentitySnapshot::authenticated(RoleSet::new(["StoreKeeper"])));
        guard.observe(&IdentitySnapshot::authenticated(RoleSet::new(["Cutting"])));

        assert!(logs_contain("Guard 'store' initializing -> allowed"));
        assert!(logs_contain("Guard 'store' allowed -> denied"));
        assert!(!logs_contain("checking -> "));
    }

    #[test]
    fn test_custom_deny_path() {
        let mut guard = store_guard().with_deny_path("/store/no-access");

        let signal = guard.observe(&IdentitySnapshot::authenticated(RoleSet::new(["HR"])));
        assert_eq!(signal, Some(GuardSignal::navigate("/store/no-access")));
    }

    #[test]
    fn test_unrestricted_section_renders() {
        let mut guard =
            GuardOrchestrator::section("profile", RequiredRoleSet::unrestricted(), table());

        let signal = guard.observe(&IdentitySnapshot::authenticated(RoleSet::new(["Quality"])));
        assert_eq!(signal, Some(GuardSignal::RenderChildren));
    }

    #[test]
    fn test_landing_guard() {
        let mut guard = GuardOrchestrator::landing(table());

        let signal = guard.observe(&IdentitySnapshot::authenticated(RoleSet::new([
            "Cutting", "Accounts",
        ])));
        assert_eq!(signal, Some(GuardSignal::navigate("/cutting/dashboard")));
        assert_eq!(guard.state(), GuardState::Redirected);
    }

    #[test]
    fn test_set_required_reevaluates() {
        let mut guard = store_guard();
        guard.observe(&IdentitySnapshot::authenticated(RoleSet::new(["Accounts"])));
        assert_eq!(guard.state(), GuardState::Denied);

        let signal = guard.set_required(RequiredRoleSet::new(["Accounts"]));
        assert_eq!(signal, Some(GuardSignal::RenderChildren));
        assert_eq!(guard.state(), GuardState::Allowed);

        assert_eq!(guard.set_required(RequiredRoleSet::new(["Accounts"])), None);
    }

    #[test]
    fn test_transition_is_pure() {
        let guard = store_guard();
        let snapshot = IdentitySnapshot::authenticated(RoleSet::new(["Store"]));

        assert_eq!(guard.transition(&snapshot), guard.transition(&snapshot));
        assert_eq!(guard.state(), GuardState::Initializing);
        assert!(guard.last_signal().is_none());
    }
}
