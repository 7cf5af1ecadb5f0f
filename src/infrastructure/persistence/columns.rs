//! Column checks shared by the resource stores.

use serde_json::json;

use crate::domain::query::{BASE_FIELDS, Entity, FieldDef, FieldValue, Record};
use crate::error::AppError;

/// Audit and soft-delete columns every resource table carries besides
/// [`BASE_FIELDS`]. Never filterable and never written by mapping hooks.
pub const CREATED_BY: &str = "created_by";
pub const UPDATED_BY: &str = "updated_by";
pub const DELETED_AT: &str = "deleted_at";
pub const DELETED_BY: &str = "deleted_by";

/// Resolves the columns of a record handed in by a mapping hook.
///
/// Only the entity's own fields may be written; store-managed columns and
/// unknown names point at a broken mapping and are reported as internal errors.
pub fn writable<'r, E: Entity>(
    record: &'r Record,
) -> Result<Vec<(FieldDef, &'r FieldValue)>, AppError> {
    record
        .iter()
        .map(|(name, value)| {
            E::FIELDS
                .iter()
                .find(|f| f.name == name)
                .map(|def| (*def, value))
                .ok_or_else(|| {
                    let managed = BASE_FIELDS.iter().any(|f| f.name == name);
                    AppError::internal(
                        format!("{} mapping wrote a non-writable column", E::RESOURCE),
                        json!({ "column": name, "managed": managed }),
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Color;

    #[test]
    fn test_entity_fields_are_writable() {
        let record = Record::new().with("name", "red").with("hex_code", "#FF0000");
        let columns = writable::<Color>(&record).unwrap();

        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_managed_columns_are_rejected() {
        let record = Record::new().with("id", 5_i64);
        assert!(writable::<Color>(&record).is_err());
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        let record = Record::new().with("shade", "dark");
        assert!(writable::<Color>(&record).is_err());
    }
}
