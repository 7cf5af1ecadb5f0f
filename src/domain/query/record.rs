//! Field catalogue and the loosely-typed record exchanged with stores.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::AppError;

/// Storage kind of a field; drives value coercion and operator support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
}

/// A filterable, sortable column of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub unique: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            unique: false,
        }
    }

    pub const fn unique(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            unique: true,
        }
    }
}

/// Columns every resource table carries, managed by the store.
pub const BASE_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", FieldKind::Integer),
    FieldDef::new("created_at", FieldKind::Timestamp),
    FieldDef::new("updated_at", FieldKind::Timestamp),
];

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Orders two values of the same kind. Nulls sort after every value.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Null, _) => Some(Ordering::Greater),
            (_, Self::Null) => Some(Ordering::Less),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Column name to value map.
///
/// Used in both directions: mapping hooks build records for inserts and
/// partial updates, stores hand back persisted rows as records for
/// [`super::Entity::from_record`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Sets the field only when a value was supplied. Used for partial updates,
    /// where an absent field must leave the stored value untouched.
    pub fn set_present<T: Into<FieldValue>>(&mut self, field: &str, value: Option<T>) {
        if let Some(v) = value {
            self.set(field, v);
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overwrites this record's fields with every field present in `changes`.
    pub fn apply(&mut self, changes: &Record) {
        for (field, value) in changes.iter() {
            self.set(field, value.clone());
        }
    }

    pub fn integer(&self, field: &str) -> Result<i64, AppError> {
        match self.get(field) {
            Some(FieldValue::Integer(v)) => Ok(*v),
            other => Err(decode_error(field, "integer", other)),
        }
    }

    pub fn float(&self, field: &str) -> Result<f64, AppError> {
        match self.get(field) {
            Some(FieldValue::Float(v)) => Ok(*v),
            Some(FieldValue::Integer(v)) => Ok(*v as f64),
            other => Err(decode_error(field, "float", other)),
        }
    }

    pub fn boolean(&self, field: &str) -> Result<bool, AppError> {
        match self.get(field) {
            Some(FieldValue::Boolean(v)) => Ok(*v),
            other => Err(decode_error(field, "boolean", other)),
        }
    }

    pub fn text(&self, field: &str) -> Result<String, AppError> {
        match self.get(field) {
            Some(FieldValue::Text(v)) => Ok(v.clone()),
            other => Err(decode_error(field, "text", other)),
        }
    }

    pub fn optional_text(&self, field: &str) -> Result<Option<String>, AppError> {
        match self.get(field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Text(v)) => Ok(Some(v.clone())),
            other => Err(decode_error(field, "text", other)),
        }
    }

    pub fn timestamp(&self, field: &str) -> Result<DateTime<Utc>, AppError> {
        match self.get(field) {
            Some(FieldValue::Timestamp(v)) => Ok(*v),
            other => Err(decode_error(field, "timestamp", other)),
        }
    }
}

fn decode_error(field: &str, expected: &str, found: Option<&FieldValue>) -> AppError {
    AppError::internal(
        "Stored record has an unexpected shape",
        json!({ "field": field, "expected": expected, "found": format!("{found:?}") }),
    )
}
