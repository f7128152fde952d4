use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::{judge::JudgeError, package_store::PackageError},
    state::{package::QuestionKeyError, state_machine::InvalidTransition},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// An external collaborator failed.
    #[error("external service failed: {0}")]
    ExternalService(String),
    /// An external collaborator did not answer in time.
    #[error("operation timed out")]
    Timeout,
}

impl ServiceError {
    /// Machine-checkable reason reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidInput(_) | ServiceError::InvalidState(_) => "validation_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::ExternalService(_) | ServiceError::Timeout => "external_service_error",
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<QuestionKeyError> for ServiceError {
    fn from(err: QuestionKeyError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<PackageError> for ServiceError {
    fn from(err: PackageError) -> Self {
        ServiceError::InvalidInput(format!("package rejected: {err}"))
    }
}

impl From<JudgeError> for ServiceError {
    fn from(err: JudgeError) -> Self {
        ServiceError::ExternalService(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// An upstream collaborator failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// An upstream collaborator timed out.
    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::ExternalService(message) => AppError::BadGateway(message),
            ServiceError::Timeout => AppError::GatewayTimeout("operation timed out".into()),
        }
    }
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) | AppError::Conflict(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::BadGateway(_) | AppError::GatewayTimeout(_) => "external_service_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Body of every rejected request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// `validation_error`, `not_found` or `external_service_error`.
    pub code: String,
    /// Human-readable reason.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        });

        (self.status(), payload).into_response()
    }
}
