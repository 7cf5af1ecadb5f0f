//! Core domain entities.
//!
//! Catalog entities implement [`crate::domain::query::Entity`] so the generic
//! resource service and stores can handle them without per-type code.
//!
//! # Entity Types
//!
//! - [`Color`], [`CarType`], [`CarModel`], [`PropertyCategory`], [`Property`] - catalog resources
//! - [`User`] - accounts used for authentication (not a generic resource)

pub mod car;
pub mod color;
pub mod property;
pub mod user;

pub use car::{CarModel, CarType};
pub use color::Color;
pub use property::{Property, PropertyCategory};
pub use user::{ADMIN_ROLE, DEFAULT_ROLE, NewUser, User};
