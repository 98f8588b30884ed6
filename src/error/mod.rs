use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Work tracker error: {0}")]
    Ado(#[from] AdoError),

    #[error("AI generator error: {0}")]
    Ai(#[from] AiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data integrity error: {message}")]
    DataIntegrity { message: String },

    #[error("Request deadline of {deadline_secs}s exceeded")]
    DeadlineExceeded { deadline_secs: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Work-tracker (Azure DevOps) errors
#[derive(Debug, Error)]
pub enum AdoError {
    #[error("Unauthorized: credential rejected by work tracker")]
    Unauthorized,

    #[error("Forbidden: credential lacks permission for this resource")]
    Forbidden,

    #[error("Work item {work_item_id} not found")]
    NotFound { work_item_id: u32 },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

impl AdoError {
    /// Whether the error is transient and safe to retry. Auth, permission,
    /// and not-found responses are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AdoError::Connection { .. } | AdoError::Timeout { .. } => true,
            AdoError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// AI generator errors
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI generator unavailable: {message}")]
    Unavailable { message: String },

    #[error("AI generator rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Error code taxonomy surfaced in error response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    UpstreamAuth,
    UpstreamPermission,
    UpstreamNotFound,
    UpstreamConnection,
    AiUnavailable,
    AiRateLimited,
    Internal,
}

impl AppError {
    /// Map an application error to its outward error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            AppError::Ado(AdoError::Unauthorized) => ErrorCode::UpstreamAuth,
            AppError::Ado(AdoError::Forbidden) => ErrorCode::UpstreamPermission,
            AppError::Ado(AdoError::NotFound { .. }) => ErrorCode::UpstreamNotFound,
            AppError::Ado(_) => ErrorCode::UpstreamConnection,
            AppError::Ai(AiError::RateLimited { .. }) => ErrorCode::AiRateLimited,
            AppError::Ai(_) => ErrorCode::AiUnavailable,
            _ => ErrorCode::Internal,
        }
    }

    /// Outward-facing message. Internal conditions get a generic message;
    /// the full detail goes to the audit log instead.
    pub fn public_message(&self) -> String {
        match self.code() {
            ErrorCode::Internal => "An internal error occurred".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error response body returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl ErrorBody {
    /// Build an error body from an application error.
    pub fn from_error(err: &AppError, request_id: impl Into<String>) -> Self {
        Self {
            error_code: err.code(),
            message: err.public_message(),
            details: None,
            timestamp: Utc::now(),
            request_id: request_id.into(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for work-tracker operations
pub type AdoResult<T> = Result<T, AdoError>;

/// Result type alias for AI generator operations
pub type AiResult<T> = Result<T, AiError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
