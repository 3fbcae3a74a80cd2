//! # Domain Layer
//!
//! The domain layer contains the core business logic of the clip platform.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities and repository traits
//! - **services**: Pure computations (trust score, cohorts, badges)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure layers
//! - Pure business logic and domain rules
//! - Repository traits define data access contracts

pub mod entities;
pub mod services;

// Re-export commonly used types
pub use entities::*;
