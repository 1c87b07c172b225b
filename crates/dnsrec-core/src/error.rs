//! Error types for dnsrec
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dnsrec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for record adapters
#[derive(Error, Debug)]
pub enum Error {
    /// No hosted zone matched the requested zone name
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// Several hosted zones matched and nothing disambiguated them
    #[error("Ambiguous zone {zone}: {matches} hosted zones match")]
    AmbiguousZone {
        /// Requested zone name
        zone: String,
        /// Number of matching hosted zones
        matches: usize,
    },

    /// Listing zones or record sets failed
    #[error("Record lookup failed: {0}")]
    RecordLookup(String),

    /// The provider rejected a change batch for semantic reasons
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// Rate limiting or network fault
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "zone not found" error
    pub fn zone_not_found(zone: impl Into<String>) -> Self {
        Self::ZoneNotFound(zone.into())
    }

    /// Create an ambiguous zone error
    pub fn ambiguous_zone(zone: impl Into<String>, matches: usize) -> Self {
        Self::AmbiguousZone {
            zone: zone.into(),
            matches,
        }
    }

    /// Create a record lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::RecordLookup(msg.into())
    }

    /// Create a submission rejected error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::SubmissionRejected(msg.into())
    }

    /// Create a transient failure error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether a retry of the failed call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether this error was caused by caller cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
