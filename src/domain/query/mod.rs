//! Filter/pagination engine.
//!
//! Turns an abstract [`FilterSpec`] plus [`PageRequest`] into a [`QueryPlan`]
//! that any store can execute:
//!
//! - conditions are AND-combined, each mapping to one store predicate
//! - the total is counted over the filtered set, before pagination
//! - ordering is deterministic (`id ASC` tie-breaker)
//!
//! # Modules
//!
//! - [`record`] - field catalogue, values and records
//! - [`filter`] - client-facing filter and sort specifications
//! - [`page`] - page requests and paged results
//! - [`plan`] - validated query plans and in-process evaluation

pub mod filter;
pub mod page;
pub mod plan;
pub mod record;

pub use filter::{FilterCondition, FilterOperator, FilterSpec, SortDirection, SortSpec};
pub use page::{PageRequest, PagedList};
pub use plan::{Comparison, Predicate, QueryPlan, SortKey};
pub use record::{BASE_FIELDS, FieldDef, FieldKind, FieldValue, Record};

use crate::error::AppError;

/// A persisted resource record.
///
/// The store owns identity and the base columns (`id`, `created_at`,
/// `updated_at`); implementors declare their own columns in [`Entity::FIELDS`]
/// and decode themselves from a [`Record`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable resource name used in error messages.
    const RESOURCE: &'static str;

    /// Backing table.
    const TABLE: &'static str;

    /// Resource-specific columns, excluding the base columns.
    const FIELDS: &'static [FieldDef];

    fn id(&self) -> i64;

    fn from_record(record: &Record) -> Result<Self, AppError>;

    /// Ordering used when a query does not ask for one.
    fn default_sort() -> Vec<SortSpec> {
        Vec::new()
    }

    fn all_fields() -> impl Iterator<Item = FieldDef> {
        BASE_FIELDS.iter().chain(Self::FIELDS.iter()).copied()
    }

    fn field(name: &str) -> Option<FieldDef> {
        Self::all_fields().find(|f| f.name == name)
    }
}
