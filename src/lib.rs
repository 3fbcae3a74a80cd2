//! # Clip Repository Library
//!
//! This crate provides the persistence layer of a clip-sharing platform:
//! - Staging clip discovery and promotion into the published catalogue
//! - Communities, playlists, submissions and curation queries
//! - Reports, creator verification, DMCA compliance and reputation
//! - Revenue analytics and regional mirror bookkeeping
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities, repository traits and pure services
//! - **Infrastructure Layer**: PostgreSQL repositories, query composition and metrics
//!
//! ## Module Structure
//!
//! ```text
//! clip_repository/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, repository traits, services
//! +-- infrastructure/ Database, repositories and metrics
//! +-- shared/         Common utilities (errors, pagination)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Shared utilities
pub mod shared;

// Repository wiring and maintenance
pub mod startup;

// Telemetry and observability
pub mod telemetry;
