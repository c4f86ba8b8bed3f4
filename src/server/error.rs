//! The single place where store failures become HTTP responses.

use crate::library::LibraryError;
use crate::user::UserError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error};

pub type ApiResult<T> = Result<T, ApiError>;

const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    timestamp: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The cause is logged here and never sent to the client.
    pub fn internal(cause: impl fmt::Display) -> Self {
        error!("{}", cause);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_SERVER_ERROR_MESSAGE,
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            debug!("Rejected request: {}", self);
        }
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        let status = match &err {
            LibraryError::InvalidIdentifier(_)
            | LibraryError::DuplicateName { .. }
            | LibraryError::InvalidReference { .. } => StatusCode::BAD_REQUEST,
            LibraryError::NotFound { .. } | LibraryError::NotFavorited { .. } => {
                StatusCode::NOT_FOUND
            }
            LibraryError::UnprocessableReference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LibraryError::AlreadyFavorited { .. } => StatusCode::CONFLICT,
            LibraryError::CascadeAborted { .. }
            | LibraryError::Storage(_)
            | LibraryError::Poisoned => return ApiError::internal(err),
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        let status = match &err {
            UserError::InvalidIdentifier(_)
            | UserError::LoginTaken(_)
            | UserError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            UserError::NotFound(_) => StatusCode::NOT_FOUND,
            UserError::WrongPassword | UserError::InvalidCredentials | UserError::InvalidToken => {
                StatusCode::FORBIDDEN
            }
            UserError::Hashing(_)
            | UserError::Signing(_)
            | UserError::Storage(_)
            | UserError::Poisoned => return ApiError::internal(err),
        };
        ApiError::new(status, err.to_string())
    }
}
