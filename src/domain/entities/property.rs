//! Property and property category entities.

use chrono::{DateTime, Utc};

use crate::domain::query::{Entity, FieldDef, FieldKind, Record};
use crate::error::AppError;

/// Grouping for properties, e.g. "Engine" or "Comfort".
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCategory {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for PropertyCategory {
    const RESOURCE: &'static str = "Property category";
    const TABLE: &'static str = "property_categories";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::unique("name", FieldKind::Text),
        FieldDef::new("icon", FieldKind::Text),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self, AppError> {
        Ok(Self {
            id: record.integer("id")?,
            name: record.text("name")?,
            icon: record.text("icon")?,
            created_at: record.timestamp("created_at")?,
            updated_at: record.timestamp("updated_at")?,
        })
    }
}

/// A measurable attribute such as "Fuel consumption" (unit "l/100km").
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub unit: String,
    pub description: Option<String>,
    pub data_type: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Property {
    const RESOURCE: &'static str = "Property";
    const TABLE: &'static str = "properties";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("name", FieldKind::Text),
        FieldDef::new("icon", FieldKind::Text),
        FieldDef::new("unit", FieldKind::Text),
        FieldDef::new("description", FieldKind::Text),
        FieldDef::new("data_type", FieldKind::Text),
        FieldDef::new("category_id", FieldKind::Integer),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self, AppError> {
        Ok(Self {
            id: record.integer("id")?,
            name: record.text("name")?,
            icon: record.text("icon")?,
            unit: record.text("unit")?,
            description: record.optional_text("description")?,
            data_type: record.text("data_type")?,
            category_id: record.integer("category_id")?,
            created_at: record.timestamp("created_at")?,
            updated_at: record.timestamp("updated_at")?,
        })
    }
}
