//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and short-lived state.
//!
//! # Modules
//!
//! - [`cache`] - OTP state stores (Redis and in-process implementations)
//! - [`persistence`] - PostgreSQL and in-memory repository implementations

pub mod cache;
pub mod persistence;
