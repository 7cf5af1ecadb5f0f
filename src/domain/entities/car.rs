//! Car type and car model entities.

use chrono::{DateTime, Utc};

use crate::domain::query::{Entity, FieldDef, FieldKind, Record};
use crate::error::AppError;

/// Body style, e.g. "Sedan" or "SUV".
#[derive(Debug, Clone, PartialEq)]
pub struct CarType {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for CarType {
    const RESOURCE: &'static str = "Car type";
    const TABLE: &'static str = "car_types";
    const FIELDS: &'static [FieldDef] = &[FieldDef::unique("name", FieldKind::Text)];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self, AppError> {
        Ok(Self {
            id: record.integer("id")?,
            name: record.text("name")?,
            created_at: record.timestamp("created_at")?,
            updated_at: record.timestamp("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarModel {
    pub id: i64,
    pub name: String,
    pub car_type_id: i64,
    pub gearbox: String,
    pub base_price: f64,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for CarModel {
    const RESOURCE: &'static str = "Car model";
    const TABLE: &'static str = "car_models";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("name", FieldKind::Text),
        FieldDef::new("car_type_id", FieldKind::Integer),
        FieldDef::new("gearbox", FieldKind::Text),
        FieldDef::new("base_price", FieldKind::Float),
        FieldDef::new("is_available", FieldKind::Boolean),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self, AppError> {
        Ok(Self {
            id: record.integer("id")?,
            name: record.text("name")?,
            car_type_id: record.integer("car_type_id")?,
            gearbox: record.text("gearbox")?,
            base_price: record.float("base_price")?,
            is_available: record.boolean("is_available")?,
            created_at: record.timestamp("created_at")?,
            updated_at: record.timestamp("updated_at")?,
        })
    }
}
