//! Error types for StoryMagic
//!
//! This module defines the error taxonomy used throughout the service,
//! using `thiserror` for ergonomic error handling. HTTP status mapping for
//! these variants lives in [`crate::server::ApiError`].

use thiserror::Error;

/// Main error type for StoryMagic operations
///
/// Covers configuration loading, provider and database interactions,
/// request validation, and the subscription/quota workflow.
#[derive(Error, Debug)]
pub enum StoryMagicError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text or illustration provider errors (API calls, parsing, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Persistence errors (remote database or in-memory repository)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Missing or malformed request fields
    #[error("{0}")]
    Validation(String),

    /// A requested record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Email/password pair did not match a user
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A unique record already exists (e.g. duplicate email)
    #[error("{0}")]
    Conflict(String),

    /// Plan id is unknown or not valid for the requested transition
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// Monthly story allowance for the user's plan is used up
    #[error("Monthly story limit reached for {plan} plan: used={used}, limit={limit}")]
    QuotaExceeded {
        /// Plan id the user is on
        plan: String,
        /// Stories generated in the current cycle
        used: u32,
        /// Plan allowance per cycle
        limit: u32,
    },

    /// Password hashing failures
    #[error("Credential error: {0}")]
    Credential(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for StoryMagic operations
///
/// Uses `anyhow::Error` so call sites can attach context while handlers
/// can still downcast to [`StoryMagicError`] for status mapping.
pub type Result<T> = anyhow::Result<T>;
