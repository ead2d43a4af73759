//! Policy storage errors.

use chrono::NaiveDate;
use thiserror::Error;
use vellum_types::PolicyId;

/// Errors raised by a [`PolicyStore`](crate::PolicyStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's lock was poisoned by a panicking writer.
    #[error("policy store lock poisoned")]
    LockPoisoned,

    #[error("policy {0} not found")]
    NotFound(PolicyId),

    /// No id is left to assign after this one.
    #[error("policy ids exhausted after {0}")]
    IdsExhausted(PolicyId),

    /// The validity window ends before it starts.
    #[error("policy window is empty: starts {start}, ends {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, StoreError>;
