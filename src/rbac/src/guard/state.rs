//! Guard inputs, states and output signals

use crate::types::{Path, RoleSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the identity source currently reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    /// Whether the identity source has finished loading
    pub ready: bool,

    /// Roles of the signed-in identity, if any
    #[serde(default)]
    pub roles: Option<RoleSet>,
}

impl IdentitySnapshot {
    /// Identity source still loading
    pub fn loading() -> Self {
        Self {
            ready: false,
            roles: None,
        }
    }

    /// Ready, nobody signed in
    pub fn anonymous() -> Self {
        Self {
            ready: true,
            roles: None,
        }
    }

    /// Ready, signed in with the given roles
    pub fn authenticated(roles: RoleSet) -> Self {
        Self {
            ready: true,
            roles: Some(roles),
        }
    }

    /// Roles of a present identity
    ///
    /// An empty role set counts as no identity.
    pub fn identity(&self) -> Option<&RoleSet> {
        self.roles.as_ref().filter(|roles| !roles.is_empty())
    }
}

/// Guard state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    /// Waiting for the identity source
    Initializing,
    /// Ready with no identity; sent to login
    Unauthenticated,
    /// Identity present, verdict being computed
    Checking,
    /// Protected content may render
    Allowed,
    /// Sent to the access-denied destination
    Denied,
    /// Landing guard sent the identity to its landing path
    Redirected,
}

impl GuardState {
    /// Whether the state carries a final outcome for the current snapshot
    pub fn is_settled(self) -> bool {
        !matches!(self, GuardState::Initializing | GuardState::Checking)
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardState::Initializing => "initializing",
            GuardState::Unauthenticated => "unauthenticated",
            GuardState::Checking => "checking",
            GuardState::Allowed => "allowed",
            GuardState::Denied => "denied",
            GuardState::Redirected => "redirected",
        };
        f.write_str(name)
    }
}

/// Instruction for the navigation/rendering collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "path")]
pub enum GuardSignal {
    /// Neither render nor navigate yet
    Loading,
    /// Navigate to the given path
    NavigateTo(Path),
    /// Render the protected content
    RenderChildren,
}

impl GuardSignal {
    pub fn navigate(path: impl Into<Path>) -> Self {
        GuardSignal::NavigateTo(path.into())
    }
}
