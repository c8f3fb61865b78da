//! # API Error Type
//!
//! Every handler returns `ApiResult<T>`. Failures from any layer become an
//! [`ApiError`], which the dashboard shows as a notification.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally ERP                              │
//! │                                                                         │
//! │  Handler                                                               │
//! │     │                                                                   │
//! │     ├── ValidationError ──► VALIDATION_ERROR  400  (nothing written)   │
//! │     ├── CoreError ────────► NOT_FOUND 404 / BUSINESS_LOGIC 422 /       │
//! │     │                       STALE_BALANCE 409                          │
//! │     └── DbError ──────────► logged with tracing::error!, then          │
//! │                             DATABASE_ERROR 500 (generic message)       │
//! │                                                                         │
//! │  Response body:                                                        │
//! │     { "code": "NOT_FOUND", "message": "Order not found: O202404009" }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes already made by the handler before the failure are not rolled back.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_db::DbError;

use crate::config::ConfigError;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// The notification payload returned for any failed request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message for the notification
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource or route not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Business rule refused the action (422)
    BusinessLogic,

    /// Supplier balances moved since the form was loaded (409)
    StaleBalance,

    /// Store operation failed (500)
    DatabaseError,

    /// Anything else (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::BusinessLogic => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::StaleBalance => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts storage errors to API errors.
///
/// Details of store failures are logged here and replaced with a generic
/// message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Dataset(e) => {
                tracing::error!("Dataset error: {}", e);
                ApiError::new(ErrorCode::Internal, "Dataset could not be read")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => ApiError::not_found(entity, id),
            e @ (CoreError::InvalidTransition { .. } | CoreError::OrderClosed { .. }) => {
                ApiError::new(ErrorCode::BusinessLogic, e.to_string())
            }
            e @ CoreError::StaleOpeningBalance { .. } => {
                ApiError::new(ErrorCode::StaleBalance, e.to_string())
            }
            CoreError::InvalidIdentifier(id) => {
                ApiError::validation(format!("Invalid identifier '{}'", id))
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Startup Errors
// =============================================================================

/// Failures that stop the server from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] DbError),

    /// The demo dataset could not be built.
    #[error("Mock dataset error: {0}")]
    Dataset(#[from] CoreError),

    /// Binding the listener or serving connections failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
