//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`.
//!
//! # Available Repositories
//!
//! - [`ResourceRepository`] - generic store for catalog entities
//! - [`UserRepository`] - user accounts

pub mod resource_repository;
pub mod user_repository;

pub use resource_repository::ResourceRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use user_repository::MockUserRepository;
