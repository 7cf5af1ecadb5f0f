//! Color entity.

use chrono::{DateTime, Utc};

use crate::domain::query::{Entity, FieldDef, FieldKind, Record, SortSpec};
use crate::error::AppError;

/// A paint color offered for car models.
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub id: i64,
    pub name: String,
    pub hex_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Color {
    const RESOURCE: &'static str = "Color";
    const TABLE: &'static str = "colors";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::unique("name", FieldKind::Text),
        FieldDef::new("hex_code", FieldKind::Text),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self, AppError> {
        Ok(Self {
            id: record.integer("id")?,
            name: record.text("name")?,
            hex_code: record.text("hex_code")?,
            created_at: record.timestamp("created_at")?,
            updated_at: record.timestamp("updated_at")?,
        })
    }

    fn default_sort() -> Vec<SortSpec> {
        vec![SortSpec::asc("name")]
    }
}
