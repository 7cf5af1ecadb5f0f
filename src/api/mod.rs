//! REST API layer for HTTP request/response handling.
//!
//! Translates HTTP requests into service calls and renders results in the
//! uniform response envelope.
//!
//! # Modules
//!
//! - [`dto`] - request/response shapes and resource mappings
//! - [`extract`] - extractors reporting failures through the envelope
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - admission gates and request tracing
//! - [`routes`] - route tables

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
