//! Repository implementations.
//!
//! PostgreSQL stores use SQLx with bound parameters; in-memory stores back
//! tests and database-free local runs with the same observable semantics.
//!
//! # Repositories
//!
//! - [`PgResourceRepository`] / [`InMemoryResourceRepository`] - catalog resources
//! - [`PgUserRepository`] / [`InMemoryUserRepository`] - user accounts

mod columns;
pub mod memory_resource_repository;
pub mod memory_user_repository;
pub mod pg_resource_repository;
pub mod pg_user_repository;

pub use memory_resource_repository::InMemoryResourceRepository;
pub use memory_user_repository::InMemoryUserRepository;
pub use pg_resource_repository::PgResourceRepository;
pub use pg_user_repository::PgUserRepository;
