//! Utility functions and helpers
//!
//! This module provides the resilience helpers shared by every remote backend.
//!
//! ## Modules
//!
//! - [`retry`] - Bounded retry with a fixed delay
//! - [`paginate`] - Draining of token-continued listings

pub mod paginate;
pub mod retry;

pub use paginate::{Page, list_all, list_all_strict};
pub use retry::RetryPolicy;
