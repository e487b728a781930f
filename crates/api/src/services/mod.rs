//! Clients for the external scoring dependencies.

pub mod embeddings;
pub mod predictor;

pub use embeddings::HttpEmbeddingProvider;
pub use predictor::HttpPredictor;

use domain::DependencyError;

/// Map a transport failure onto the dependency error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error, timeout_ms: u64) -> DependencyError {
    if err.is_timeout() {
        DependencyError::Timeout(timeout_ms)
    } else if err.is_decode() {
        DependencyError::InvalidResponse(err.to_string())
    } else {
        DependencyError::Unavailable(err.to_string())
    }
}
