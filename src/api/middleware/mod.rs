//! HTTP middleware for request admission and observability.
//!
//! Admission control is expressed as [`chain::Gate`]s composed per route into
//! a [`chain::GateChain`]:
//!
//! - [`rate_limit::RateLimitGate`] - per-client token bucket (429)
//! - [`auth::AuthenticationGate`] - bearer token verification (401)
//! - [`authorization::AuthorizationGate`] - role check (403)
//!
//! [`cors`] and [`tracing`] wrap the whole router instead.

pub mod auth;
pub mod authorization;
pub mod chain;
pub mod cors;
pub mod rate_limit;
pub mod tracing;

pub use auth::AuthenticationGate;
pub use authorization::AuthorizationGate;
pub use chain::{Gate, GateChain};
pub use rate_limit::{ClientRateLimiter, Limiters, RateLimitGate};
