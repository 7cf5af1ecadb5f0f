//! Property category and property DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::ResourceMapping;
use crate::domain::entities::{Property, PropertyCategory};
use crate::domain::query::{FieldValue, Record};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyCategoryRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[validate(length(min = 1, max = 1000))]
    pub icon: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyCategoryRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 1000))]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCategoryResponse {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct PropertyCategoryResource;

impl ResourceMapping for PropertyCategoryResource {
    type Entity = PropertyCategory;
    type CreateRequest = CreatePropertyCategoryRequest;
    type UpdateRequest = UpdatePropertyCategoryRequest;
    type Response = PropertyCategoryResponse;

    fn to_record(request: CreatePropertyCategoryRequest) -> Record {
        Record::new()
            .with("name", request.name)
            .with("icon", request.icon)
    }

    fn to_changes(request: UpdatePropertyCategoryRequest) -> Record {
        let mut changes = Record::new();
        changes.set_present("name", request.name);
        changes.set_present("icon", request.icon);
        changes
    }

    fn to_response(category: &PropertyCategory) -> PropertyCategoryResponse {
        PropertyCategoryResponse {
            id: category.id,
            name: category.name.clone(),
            icon: category.icon.clone(),
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[validate(length(min = 1, max = 1000))]
    pub icon: String,

    #[validate(length(min = 1, max = 20))]
    pub unit: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 20))]
    pub data_type: String,

    #[validate(range(min = 1))]
    pub category_id: i64,
}

/// Partial property update.
///
/// `description` distinguishes an absent key (keep) from `null` (clear).
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 1000))]
    pub icon: Option<String>,

    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 1000))]
    pub description: Option<Option<String>>,

    #[validate(length(min = 1, max = 20))]
    pub data_type: Option<String>,

    #[validate(range(min = 1))]
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
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

pub struct PropertyResource;

impl ResourceMapping for PropertyResource {
    type Entity = Property;
    type CreateRequest = CreatePropertyRequest;
    type UpdateRequest = UpdatePropertyRequest;
    type Response = PropertyResponse;

    fn to_record(request: CreatePropertyRequest) -> Record {
        Record::new()
            .with("name", request.name)
            .with("icon", request.icon)
            .with("unit", request.unit)
            .with("description", request.description)
            .with("data_type", request.data_type)
            .with("category_id", request.category_id)
    }

    fn to_changes(request: UpdatePropertyRequest) -> Record {
        let mut changes = Record::new();
        changes.set_present("name", request.name);
        changes.set_present("icon", request.icon);
        changes.set_present("unit", request.unit);
        changes.set_present("description", request.description.map(FieldValue::from));
        changes.set_present("data_type", request.data_type);
        changes.set_present("category_id", request.category_id);
        changes
    }

    fn to_response(property: &Property) -> PropertyResponse {
        PropertyResponse {
            id: property.id,
            name: property.name.clone(),
            icon: property.icon.clone(),
            unit: property.unit.clone(),
            description: property.description.clone(),
            data_type: property.data_type.clone(),
            category_id: property.category_id,
            created_at: property.created_at,
            updated_at: property.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_description_is_kept() {
        let request: UpdatePropertyRequest = serde_json::from_str(r#"{ "unit": "kg" }"#).unwrap();
        let changes = PropertyResource::to_changes(request);

        assert_eq!(changes.len(), 1);
        assert!(changes.get("description").is_none());
    }

    #[test]
    fn test_null_description_is_cleared() {
        let request: UpdatePropertyRequest =
            serde_json::from_str(r#"{ "description": null }"#).unwrap();
        let changes = PropertyResource::to_changes(request);

        assert_eq!(changes.get("description"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_category_id_must_be_positive() {
        let request: UpdatePropertyRequest =
            serde_json::from_str(r#"{ "categoryId": 0 }"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_description_limit_applies_to_create_and_update() {
        let long = "d".repeat(1001);
        let create: CreatePropertyRequest = serde_json::from_value(serde_json::json!({
            "name": "Power",
            "icon": "bolt.svg",
            "unit": "hp",
            "description": long,
            "dataType": "number",
            "categoryId": 1
        }))
        .unwrap();
        let update: UpdatePropertyRequest =
            serde_json::from_value(serde_json::json!({ "description": long })).unwrap();

        assert!(create.validate().is_err());
        assert!(update.validate().is_err());

        let cleared: UpdatePropertyRequest =
            serde_json::from_str(r#"{ "description": null }"#).unwrap();
        assert!(cleared.validate().is_ok());
    }
}
