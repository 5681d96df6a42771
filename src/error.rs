//! Domain error types for the order intake server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use std::path::PathBuf;

/// Reasons an ingestion request fails as a whole.
///
/// Per-file problems are not errors; they are reported as
/// [`SkipReason`](crate::models::SkipReason) alongside a successful outcome.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// No free destination directory after the bounded number of attempts
    #[error("could not allocate a destination directory after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    /// One of the required order fields is empty
    #[error("missing required order fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    /// A destination file could not be created
    #[error("failed to create destination file {}", .path.display())]
    DestinationWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying an upload into its destination file failed
    #[error("failed to copy upload {filename}")]
    CopyFailed {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// The order and its file list could not be committed
    #[error("failed to persist order {order_number}")]
    PersistenceFailed {
        order_number: String,
        #[source]
        source: sea_orm::DbErr,
    },
}

impl IngestError {
    /// Stable machine-readable code for logs and API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationExhausted { .. } => "ALLOCATION_EXHAUSTED",
            Self::MissingFields { .. } => "MISSING_FIELDS",
            Self::DestinationWriteFailed { .. } => "DESTINATION_WRITE_FAILED",
            Self::CopyFailed { .. } => "COPY_FAILED",
            Self::PersistenceFailed { .. } => "PERSISTENCE_FAILED",
        }
    }
}

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Submission exceeds the configured size limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Local filesystem operation failed
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Page template failed to compile or render
    #[error("Template error: {0}")]
    Template(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::InvalidInput(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::PayloadTooLarge(_) => (
                actix_web::http::StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                self.to_string(),
            ),
            AppError::FileSystem(err_str) => {
                tracing::error!("File system error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "FILE_SYSTEM_ERROR",
                    "An internal storage error occurred".to_string(),
                )
            }
            AppError::Template(err_str) => {
                tracing::error!("Template error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "TEMPLATE_ERROR",
                    "Failed to render page".to_string(),
                )
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// JSON error response body.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}
