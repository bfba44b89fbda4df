use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Unprocessable Entity")
    pub error: String,
    /// Stable machine-readable error code
    pub code: String,
    /// Human-readable error description
    pub message: String,
    /// Part the failure is about, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
    /// Offending recursion path for cyclic BOMs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Part not found: {part_id}")]
    PartNotFound { part_id: String },

    #[error("Cyclic BOM detected at part {part_id}: {}", .path.join(" -> "))]
    CyclicBom { part_id: String, path: Vec<String> },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid depth: {0}")]
    InvalidDepth(String),

    #[error("Invalid BOM link: {0}")]
    InvalidBomLink(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Explosion exceeded the limit of {limit} nodes")]
    ExplosionLimitExceeded { limit: usize },

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error("Explosion timed out after {0} ms")]
    Timeout(u64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn part_not_found(part_id: impl Into<String>) -> Self {
        ServiceError::PartNotFound {
            part_id: part_id.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PartNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidQuantity(_) | Self::InvalidDepth(_) | Self::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::CyclicBom { .. }
            | Self::InvalidBomLink(_)
            | Self::ExplosionLimitExceeded { .. }
            | Self::ArithmeticOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DatabaseError(_) | Self::DataAccess(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code callers can branch on.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PartNotFound { .. } => "part_not_found",
            Self::CyclicBom { .. } => "cyclic_bom",
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::InvalidDepth(_) => "invalid_depth",
            Self::InvalidBomLink(_) => "invalid_bom_link",
            Self::DatabaseError(_) | Self::DataAccess(_) => "data_access",
            Self::ExplosionLimitExceeded { .. } => "explosion_limit_exceeded",
            Self::ArithmeticOverflow(_) => "arithmetic_overflow",
            Self::Timeout(_) => "timeout",
            Self::ValidationError(_) => "validation_error",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Store failures return generic messages to avoid leaking connection details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) | Self::DataAccess(_) => {
                "Part catalog is unavailable".to_string()
            }
            Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        let status = self.status_code();
        let (part_id, path) = match self {
            Self::PartNotFound { part_id } => (Some(part_id.clone()), None),
            Self::CyclicBom { part_id, path } => (Some(part_id.clone()), Some(path.clone())),
            _ => (None, None),
        };

        ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: self.kind().to_string(),
            message: self.response_message(),
            part_id,
            path,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.to_error_response())).into_response()
    }
}

/// API Error type for HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            // Delegate to ServiceError's unified status/message methods
            ApiError::ServiceError(service_error) => return service_error.into_response(),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
        };

        let error_response = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            code: code.to_string(),
            message,
            part_id: None,
            path: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(error_response)).into_response()
    }
}
