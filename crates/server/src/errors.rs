use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use tracing::{debug, error};

/// HTTP-facing error: a status code and the message sent as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let code = e.code();
        match e {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ServiceError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            ServiceError::CorruptStore { ref path, ref reason } => {
                error!(code, %path, %reason, "stored document is unreadable");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Unable to read stored data")
            }
            ServiceError::StorageReadFailed(ref reason) => {
                error!(code, %reason, "storage read failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Unable to read stored data")
            }
            ServiceError::StorageWriteFailed(ref reason) => {
                error!(code, %reason, "storage write failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Unable to save data")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => Self::bad_request(msg),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, AuthError::Conflict.to_string()),
            AuthError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, AuthError::Unauthorized.to_string()),
            AuthError::Store(inner) => inner.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "rejected JSON body");
        Self::bad_request("Invalid request")
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        debug!(reason = %rejection.body_text(), "rejected multipart body");
        Self::bad_request("Invalid form data")
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        let status = e.status();
        debug!(%status, reason = %e.body_text(), "malformed multipart field");
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(status, "Upload too large");
        }
        Self::bad_request("Invalid form data")
    }
}
