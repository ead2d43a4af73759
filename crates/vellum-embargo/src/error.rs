//! Embargo errors.

use thiserror::Error;
use vellum_authz::AuthorizeError;
use vellum_policy::StoreError;

/// Error type for embargo operations.
#[derive(Debug, Error)]
pub enum EmbargoError {
    /// The terms are neither the open-ended token nor a date.
    #[error("cannot read embargo terms {terms:?}: expected the open-ended token, yyyy, yyyy-mm, yyyy-mm-dd or an RFC 3339 timestamp")]
    Parse { terms: String },

    #[error(transparent)]
    Authorize(AuthorizeError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    /// The item is not where an embargo can be computed, e.g. it has no
    /// owning collection.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl EmbargoError {
    /// Whether the request was refused, as opposed to failing.
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::Authorize(err) if err.is_denial())
    }

    pub(crate) fn invariant(what: impl std::fmt::Display) -> Self {
        Self::InvariantViolation(what.to_string())
    }
}

// Storage failures are storage failures, whichever layer hit them.
impl From<AuthorizeError> for EmbargoError {
    fn from(err: AuthorizeError) -> Self {
        match err {
            AuthorizeError::Storage(err) => Self::Storage(err),
            other => Self::Authorize(other),
        }
    }
}

/// Result type for embargo operations.
pub type Result<T> = std::result::Result<T, EmbargoError>;
