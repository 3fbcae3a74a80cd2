//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database pool and typed query composition (PostgreSQL)
//! - Repository implementations of the domain traits
//! - Prometheus metrics

pub mod database;
pub mod metrics;
pub mod repositories;
