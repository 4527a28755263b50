//! Error types for Rollcall server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Application error codes returned in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    StoreFailure = 3,
    NoSuchStudent = 4,
    NoSuchRecord = 5,
    Duplicate = 6,
    BadValue = 7,
    AttendanceClosed = 8,
}

/// Mutating operations of the attendance reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    EnsureDefault,
    SetAbsent,
    SetPresent,
    /// Copy of today's status and month percentage onto the student
    RefreshStudent,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Operation::EnsureDefault => "ensure_default",
            Operation::SetAbsent => "set_absent",
            Operation::SetPresent => "set_present",
            Operation::RefreshStudent => "refresh_student",
        };
        write!(f, "{}", label)
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The date is a Sunday or a declared holiday, or lies outside today
    #[error("Attendance closed: {0}")]
    AttendanceClosed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{operation} failed for student {student_id} on {date}: {source}")]
    Mutation {
        operation: Operation,
        student_id: String,
        date: NaiveDate,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the caller may safely re-invoke the failed operation
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(_) | AppError::StoreUnavailable(_) => true,
            AppError::Mutation { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Attach the reconciler context to a failed store call
    pub fn in_mutation(self, operation: Operation, student_id: &str, date: NaiveDate) -> Self {
        match self {
            e @ AppError::Mutation { .. } => e,
            e => AppError::Mutation {
                operation,
                student_id: student_id.to_string(),
                date,
                source: Box::new(e),
            },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("Malformed document: {}", e))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// True when the same request can be safely retried
    pub retryable: bool,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchRecord),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::AttendanceClosed(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::AttendanceClosed)
            }
            AppError::Database(_) | AppError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::StoreFailure)
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::Mutation { source, .. } => source.status_and_code(),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Mutation { .. } => {
                tracing::warn!("{}", self);
                self.to_string()
            }
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::AttendanceClosed(msg)
            | AppError::StoreUnavailable(msg)
            | AppError::Conflict(msg) => msg.clone(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            retryable: self.is_retryable(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
