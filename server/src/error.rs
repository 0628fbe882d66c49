//! Error taxonomy for the dispatch core and its HTTP translation.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::{ApiResponse, IncidentStatus};

/// Failures raised by a record store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Every failure a core operation can report to its caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("cannot {action} an incident that is {from}")]
    InvalidTransition {
        from: IncidentStatus,
        action: &'static str,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("caller is not the staff member assigned to this incident")]
    NotAssignedStaff,

    #[error("staff member is not available for dispatch")]
    StaffUnavailable,

    #[error("staff member already holds an active assignment")]
    StaffBusy,

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("incident has already been rated for this staff member")]
    DuplicateRating,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("record store timed out")]
    Timeout,

    #[error("record store failure: {0}")]
    Store(StoreError),
}

impl DispatchError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::OutOfRange(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. }
            | Self::StaffUnavailable
            | Self::StaffBusy
            | Self::DuplicateRating
            | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::NotAssignedStaff | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout(_) => Self::Timeout,
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Store(err) => {
                tracing::error!(error = %err, "record store failure");
                "Internal storage error".to_string()
            }
            Self::Timeout => {
                tracing::warn!("record store call timed out");
                self.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_http_status() {
        assert_eq!(
            DispatchError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DispatchError::InvalidTransition {
                from: IncidentStatus::Completed,
                action: "cancel",
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            DispatchError::not_found("incident", 7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DispatchError::Unauthorized("no token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            DispatchError::from(StoreError::Timeout(Duration::from_millis(5))).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            DispatchError::from(StoreError::Constraint("x".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn transition_message_names_the_current_state() {
        let err = DispatchError::InvalidTransition {
            from: IncidentStatus::Processing,
            action: "assign",
        };
        assert_eq!(err.to_string(), "cannot assign an incident that is processing");
    }
}
