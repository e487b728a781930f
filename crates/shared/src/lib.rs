//! Shared utilities for the balloon matching service.
//!
//! Holds the custom `validator` rules used by request models.

pub mod validation;
