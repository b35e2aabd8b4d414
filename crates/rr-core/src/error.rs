//! # DomainError
//!
//! Centralized error handling for the Rusty-Reddit engine.
//! Store failures travel unchanged up to the router, which turns them into
//! `Error` responses.

use thiserror::Error;

/// The primary error type for all rr-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Duplicate id on create (e.g., a second user "u1")
    #[error("{0} already exists: {1}")]
    AlreadyExists(&'static str, String),

    /// Referenced entity missing (e.g., joining an unknown subreddit)
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    /// Malformed request (e.g., empty id)
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    /// Infrastructure failure inside a store implementation
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists(kind, id.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound(kind, id.into())
    }
}

/// A specialized Result type for Rusty-Reddit logic.
pub type Result<T> = std::result::Result<T, DomainError>;
