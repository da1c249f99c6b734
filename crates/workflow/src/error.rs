use std::time::Duration;

use thiserror::Error;

use stocktake_core::MaterialId;
use stocktake_inventory::SessionError;

use crate::ports::PortError;

/// Why a commit did not go through.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceFailure {
    #[error("{0}")]
    Rejected(String),

    #[error("no response within {0:?}")]
    TimedOut(Duration),
}

/// Errors surfaced by the navigator.
///
/// None of these corrupt the session: a failed call leaves cursor and saved
/// set as they were, so the operator can retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigatorError {
    /// No usable counted value was supplied; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The correction service reported a genuine failure. Retryable.
    #[error("saving material {material_id} failed: {failure}")]
    Persistence {
        material_id: MaterialId,
        failure: PersistenceFailure,
    },

    /// A save is already pending for this session.
    #[error("a save is already in flight")]
    SaveInFlight,

    /// A session precondition was not met (nothing loaded, empty catalog, ...).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The catalog could not be fetched.
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] PortError),
}

impl NavigatorError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether re-issuing the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NavigatorError::Persistence { .. } | NavigatorError::SaveInFlight | NavigatorError::Catalog(_)
        )
    }
}
