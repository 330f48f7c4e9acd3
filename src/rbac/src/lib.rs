//! # Dashguard RBAC
//!
//! Role-based access decisions for the dashboard's protected sections.
//!
//! ## Features
//!
//! - **Access evaluation**: any-of role matching with a privileged override
//!   for `SuperAdmin` and `Admin`
//! - **Landing resolution**: first mapped role (in identity order) picks the
//!   post-login destination
//! - **Guards**: a small state machine that waits for the identity source and
//!   emits exactly one navigate/render signal per settled evaluation
//! - **Static policy table** loaded from TOML and injected, never global
//!
//! ## Example
//!
//! ```rust
//! use dashguard_rbac::{RbacEngine, RoleSet, Verdict};
//!
//! let engine = RbacEngine::new();
//! let roles = RoleSet::new(["StoreKeeper"]);
//!
//! let decision = engine.check_section(&roles, "store").unwrap();
//! assert_eq!(decision.verdict, Verdict::Allow);
//!
//! assert_eq!(engine.landing(&roles).path, "/store/dashboard");
//! ```

pub mod audit;
pub mod engine;
pub mod error;
pub mod guard;
pub mod http;
pub mod policy;
pub mod types;

// Re-export commonly used types
pub use types::{Path, RequiredRoleSet, RoleLabel, RoleSet, Verdict, PRIVILEGED_ROLES, ROOT_PATH};
pub use engine::{
    AccessDecision, AccessEvaluator, DecisionReason, EngineConfig, LandingDecision,
    LandingReason, RbacEngine, RedirectResolver,
};
pub use guard::{GuardMode, GuardOrchestrator, GuardSignal, GuardState, IdentitySnapshot};
pub use policy::{PolicyEntry, PolicyTable, Routes, Section};
pub use audit::{AuditEntry, AuditKind, AuditLog};
pub use error::{RbacError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
