//! Error types for the RBAC decision layer
//!
//! Decisions themselves never fail. Errors only surface at the configuration
//! boundary (loading a policy table) and from name-based lookups.

use thiserror::Error;

/// RBAC errors
#[derive(Debug, Error)]
pub enum RbacError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid policy table definition
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Section name not declared in the policy table
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// Policy file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;
