//! Domain error types for AirLibre.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! `AppError` renders the custom HTML error pages; JSON endpoints answer
//! with an [`ErrorResponse`] body.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::views::errors::render_error_page;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Media storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Template rendering failed
    #[error("Template error: {0}")]
    Template(String),

    /// Any other internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message safe to show to users. Internal failures are logged here
    /// and replaced with a generic sentence.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(_) | AppError::InvalidInput(_) => self.to_string(),
            AppError::Storage(err_str) => {
                tracing::error!("Storage error: {}", err_str);
                "The file could not be stored".to_string()
            }
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                tracing::error!("{}", self);
                "An internal error occurred".to_string()
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Template(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        render_error_page(self.status_code(), &self.public_message())
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
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

// Conversion implementations for common error types

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Template(err.to_string())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<actix_web::http::Error> for AppError {
    fn from(err: actix_web::http::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<actix_web::error::HttpError> for AppError {
    fn from(err: actix_web::error::HttpError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
