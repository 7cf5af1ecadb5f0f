//! HTTP request handlers for API endpoints.
//!
//! [`resource`] holds the generic catalog handlers; the other modules serve
//! one fixed endpoint group each.

pub mod health;
pub mod metrics;
pub mod resource;
pub mod users;

pub use health::health_handler;
pub use metrics::metrics_handler;
