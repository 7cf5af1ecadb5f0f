//! Data Transfer Objects for API requests and responses.
//!
//! Request DTOs are deserialized with Serde and checked with `validator`
//! before reaching a service. Each catalog resource also declares a mapping
//! type binding its DTOs to the stored entity.

pub mod car;
pub mod color;
pub mod envelope;
pub mod health;
pub mod pagination;
pub mod property;
pub mod user;

pub use car::{CarModelResource, CarTypeResource};
pub use color::ColorResource;
pub use envelope::BaseResponse;
pub use pagination::PaginationInputWithFilter;
pub use property::{PropertyCategoryResource, PropertyResource};
