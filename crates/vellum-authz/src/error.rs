//! Authorization errors.

use thiserror::Error;
use vellum_policy::StoreError;
use vellum_types::{Action, DsoRef, EPersonId};

use crate::operation::Operation;

/// Error type for authorization decisions.
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// A delegated operation was refused.
    #[error("{} is not authorized to {operation}", describe(.actor))]
    Denied {
        operation: Operation,
        actor: Option<EPersonId>,
    },

    /// A plain action check was refused.
    #[error("{} is not authorized to {action} on {object}", describe(.actor))]
    ActionDenied {
        action: Action,
        object: DsoRef,
        actor: Option<EPersonId>,
    },

    /// The object graph or a policy references something that is not there.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AuthorizeError {
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::Denied { .. } | Self::ActionDenied { .. })
    }

    pub(crate) fn invariant(what: impl std::fmt::Display) -> Self {
        Self::InvariantViolation(what.to_string())
    }
}

fn describe(actor: &Option<EPersonId>) -> String {
    actor.map_or_else(|| "anonymous".to_string(), |a| format!("eperson {a}"))
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthorizeError>;
