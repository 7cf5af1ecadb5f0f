//! Domain layer containing entities, the query model and repository traits.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`query`] - Filter/pagination engine shared by every store
//! - [`repositories`] - Data access trait definitions
//! - [`identity`] - Authenticated caller identity
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])

pub mod entities;
pub mod identity;
pub mod query;
pub mod repositories;
