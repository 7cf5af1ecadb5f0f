//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::ResourceService`] - generic CRUD and filtered paging for catalog resources
//! - [`services::UserService`] - registration, password and OTP login, token refresh
//! - [`services::OtpService`] - one-time password issuance and validation
//! - [`services::TokenService`] - signed access/refresh tokens

pub mod context;
pub mod services;
