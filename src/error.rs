use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use strum_macros::Display;
use tracing::error;

use crate::api::response::{ApiResponse, FieldError};
use crate::model::{RequestStatus, VacationRequest};
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Entity {
    #[strum(serialize = "User")]
    User,
    #[strum(serialize = "Vacation request")]
    VacationRequest,
}

/// Lifecycle action that requires a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Action {
    #[strum(serialize = "approved")]
    Approve,
    #[strum(serialize = "rejected")]
    Reject,
    #[strum(serialize = "deleted")]
    Delete,
}

impl Action {
    pub fn review(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Rejected => Action::Reject,
            RequestStatus::Approved | RequestStatus::Pending => Action::Approve,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("Start date must be before end date")]
    InvalidRange,
    #[error("Start date must be in the future")]
    PastDate,
    #[error("You already have a vacation request for overlapping dates")]
    Conflict(Vec<VacationRequest>),
    #[error("Only pending requests can be {0}")]
    InvalidTransition(Action),
    #[error("Invalid validator")]
    InvalidValidator,
    #[error("Validation errors")]
    Validation(#[from] validator::ValidationErrors),
    #[error("{0}")]
    InvalidParameter(String),
    #[error("User with this email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResponseError for LifecycleError {
    fn status_code(&self) -> StatusCode {
        match self {
            LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
            LifecycleError::InvalidRange
            | LifecycleError::PastDate
            | LifecycleError::InvalidTransition(_)
            | LifecycleError::InvalidValidator
            | LifecycleError::Validation(_)
            | LifecycleError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            LifecycleError::Conflict(_) | LifecycleError::DuplicateEmail => StatusCode::CONFLICT,
            LifecycleError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            LifecycleError::Conflict(overlapping) => {
                ApiResponse::failure(self.to_string()).with_overlapping(overlapping.clone())
            }
            LifecycleError::Validation(errors) => {
                ApiResponse::failure(self.to_string()).with_errors(FieldError::collect(errors))
            }
            LifecycleError::Store(StoreError::Unavailable(reason)) => {
                error!(error = %reason, "Store unavailable");
                ApiResponse::failure("Database connection failed")
            }
            LifecycleError::Store(err) => {
                error!(error = %err, "Store operation failed");
                ApiResponse::failure("Internal server error")
            }
            _ => ApiResponse::failure(self.to_string()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
