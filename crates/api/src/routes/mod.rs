//! HTTP route handlers.

pub mod allocations;
pub mod health;
pub mod matches;
pub mod pops;
pub mod rankings;
