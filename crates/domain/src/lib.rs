//! Domain layer for the balloon matching service.
//!
//! This crate contains:
//! - Domain models (Candidate, CompatibilityScore, PopRecord, Match, AllocationWindow)
//! - Matching configuration
//! - Store contracts and an in-memory implementation
//! - Business logic services (scoring, diversity, pops, allocation)
//! - Domain error types

pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod store;

pub use config::MatchingConfig;
pub use errors::{DependencyError, MatchingError, StoreError};
