//! Shared Utilities
//!
//! Common utilities used across all layers.

pub mod error;
pub mod pagination;

pub use error::AppError;
pub use pagination::{Page, PageRequest};
