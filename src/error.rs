//! Error taxonomy shared by the service layer and the HTTP surface.

use thiserror::Error;

use crate::models::{LifecycleError, MissionStatus};
use crate::validation::ValidationError;

/// Every way a fleet operation can fail.
///
/// None of these are retried automatically; they are surfaced to the caller
/// as a user-facing message.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Validation Error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Invalid registration code")]
    InvalidCode,

    #[error("Registration code has expired")]
    CodeExpired,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("{0}")]
    Forbidden(String),

    #[error("Cannot move mission from {from} to {to}")]
    InvalidTransition {
        from: MissionStatus,
        to: MissionStatus,
    },

    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Remote store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type FleetResult<T> = Result<T, FleetError>;

impl From<LifecycleError> for FleetError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition { from, to } => {
                FleetError::InvalidTransition { from, to }
            }
            other => FleetError::Forbidden(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::Store(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_guards_become_forbidden() {
        let err: FleetError = LifecycleError::CaptainRequired.into();
        assert!(matches!(err, FleetError::Forbidden(_)));
        assert_eq!(err.to_string(), "Only a captain can approve missions");
    }

    #[test]
    fn validation_messages_are_user_facing() {
        let err: FleetError =
            ValidationError::single("hullIntegrity", "Hull integrity cannot be more than 100").into();
        assert_eq!(
            err.to_string(),
            "Validation Error: Hull integrity cannot be more than 100"
        );
    }
}
