/// Error types for around-service
///
/// Every store failure aborts the request and maps to a 5xx. Credential
/// failures keep the plain-text bodies clients of `/signup` and `/login`
/// already parse; everything else answers with a JSON error body.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;

use crate::services::elasticsearch::IndexError;
use crate::services::storage::StorageError;

/// Result type for around-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Could not make media public: {0}")]
    AclFailed(String),

    #[error("Index write failed: {0}")]
    IndexWriteFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Invalid password or username")]
    InvalidCredentials,

    #[error("User already exists: {0}")]
    DuplicateUsername(String),

    #[error("Empty password or username")]
    EmptyCredential,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    pub status: u16,
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::UploadFailed(_) => "upload_failed",
            AppError::AclFailed(_) => "acl_failed",
            AppError::IndexWriteFailed(_) => "index_write_failed",
            AppError::QueryFailed(_) => "query_failed",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::DuplicateUsername(_) => "duplicate_username",
            AppError::EmptyCredential => "empty_credential",
            AppError::Unauthorized(_) => "authentication_error",
            AppError::BadRequest(_) => "validation_error",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::Internal(_) => "server_error",
        }
    }

    fn is_credential_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidCredentials | AppError::DuplicateUsername(_) | AppError::EmptyCredential
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::StorageUnavailable(_)
            | AppError::UploadFailed(_)
            | AppError::AclFailed(_)
            | AppError::IndexWriteFailed(_)
            | AppError::QueryFailed(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // signup reports both as a server error
            AppError::DuplicateUsername(_) | AppError::EmptyCredential => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidCredentials => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if self.is_credential_error() {
            return HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string());
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.error_type(),
            message: self.to_string(),
            status: status.as_u16(),
        })
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable { .. } => AppError::StorageUnavailable(err.to_string()),
            StorageError::UploadFailed { .. } => AppError::UploadFailed(err.to_string()),
            StorageError::AclFailed { .. } => AppError::AclFailed(err.to_string()),
        }
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::WriteFailed { .. } => AppError::IndexWriteFailed(err.to_string()),
            IndexError::QueryFailed { .. } | IndexError::QueryRejected { .. } => {
                AppError::QueryFailed(err.to_string())
            }
            IndexError::InvalidUrl(_) | IndexError::TransportBuild(_) | IndexError::Schema { .. } => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
