use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::{PopRecord, PopRecordResponse};
use domain::{MatchingError, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String, Vec<ValidationDetail>),

    #[error("Daily pop allocation exhausted ({used}/{max})")]
    AllocationExceeded { used: u32, max: u32 },

    #[error("Balloon already double-popped")]
    AlreadyPopped(Box<PopRecord>),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_code, message, details) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", message, None),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "concurrency_conflict", message, None),
            ApiError::Validation(msg, details) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg,
                (!details.is_empty()).then(|| serde_json::json!(details)),
            ),
            ApiError::AllocationExceeded { used, max } => (
                StatusCode::TOO_MANY_REQUESTS,
                "allocation_exceeded",
                message,
                Some(serde_json::json!({ "used": used, "max": max })),
            ),
            ApiError::AlreadyPopped(record) => (
                StatusCode::CONFLICT,
                "already_popped",
                message,
                Some(serde_json::json!(PopRecordResponse::from(*record))),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Storage temporarily unavailable".into(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<MatchingError> for ApiError {
    fn from(err: MatchingError) -> Self {
        match err {
            MatchingError::Validation(msg) => ApiError::Validation(msg, Vec::new()),
            MatchingError::AllocationExceeded { used, max } => {
                ApiError::AllocationExceeded { used, max }
            }
            MatchingError::AlreadyPopped(record) => ApiError::AlreadyPopped(record),
            MatchingError::NotFound(msg) => ApiError::NotFound(msg),
            MatchingError::ConcurrencyConflict(msg) => ApiError::Conflict(msg),
            MatchingError::DependencyDegraded(e) => ApiError::ServiceUnavailable(e.to_string()),
            MatchingError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
            StoreError::UniqueViolation(msg) => ApiError::Conflict(msg),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = collect_details(&errors, "");
        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation(message, details)
    }
}

/// Flatten nested validation errors into dotted field paths.
fn collect_details(errors: &validator::ValidationErrors, prefix: &str) -> Vec<ValidationDetail> {
    use validator::ValidationErrorsKind;

    let mut details = Vec::new();
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                details.extend(field_errors.iter().map(|e| ValidationDetail {
                    field: path.clone(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                }));
            }
            ValidationErrorsKind::Struct(inner) => details.extend(collect_details(inner, &path)),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    details.extend(collect_details(inner, &format!("{path}[{index}]")));
                }
            }
        }
    }
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}
