//! Domain error types.

use thiserror::Error;

use crate::models::PopRecord;

/// Errors raised by the store contracts (database or in-memory).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Store error: {0}")]
    Backend(String),
}

/// Errors raised by external scoring dependencies (embeddings, predictor).
///
/// These never leave the scorer: every dependency has a local fallback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DependencyError {
    #[error("Dependency not configured")]
    NotConfigured,

    #[error("Dependency timed out after {0}ms")]
    Timeout(u64),

    #[error("Dependency unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response from dependency: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced by the matching services.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Daily pop allocation exhausted ({used}/{max})")]
    AllocationExceeded { used: u32, max: u32 },

    #[error("Target already double-popped")]
    AlreadyPopped(Box<PopRecord>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dependency degraded: {0}")]
    DependencyDegraded(#[from] DependencyError),

    #[error("Concurrent modification: {0}")]
    ConcurrencyConflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MatchingError {
    /// Stable machine-readable code for API responses and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            MatchingError::Validation(_) => "validation_error",
            MatchingError::AllocationExceeded { .. } => "allocation_exceeded",
            MatchingError::AlreadyPopped(_) => "already_popped",
            MatchingError::NotFound(_) => "not_found",
            MatchingError::DependencyDegraded(_) => "dependency_degraded",
            MatchingError::ConcurrencyConflict(_) => "concurrency_conflict",
            MatchingError::Store(_) => "store_error",
        }
    }
}
