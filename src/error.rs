//! Error types for the Platefront state core.
//!
//! Storage and mirror failures are deliberately non-fatal everywhere they can
//! occur after startup; the typed errors below exist so callers can tell a
//! rejected mutation (validation, authorization) apart from infrastructure
//! trouble.

use crate::models::Right;

/// Errors from the local SQLite store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the remote mirror.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The mirror could not be reached (connect failure, timeout, DNS).
    #[error("{0}")]
    Unavailable(String),

    /// The mirror answered with a non-success status.
    #[error("{0}")]
    Rejected(String),

    /// The mirror document could not be decoded.
    #[error("invalid mirror document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Rejection of a domain mutation. No state change has occurred when one of
/// these is returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MutationError {
    /// The caller lacks the right required for this operation.
    #[error("missing '{required}' right")]
    Unauthorized { required: Right },

    /// The arguments failed validation at the mutator boundary.
    #[error("{0}")]
    Validation(String),
}

impl MutationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
