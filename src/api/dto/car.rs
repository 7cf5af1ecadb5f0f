//! Car type and car model DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::ResourceMapping;
use crate::domain::entities::{CarModel, CarType};
use crate::domain::query::Record;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarTypeRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarTypeRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarTypeResponse {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct CarTypeResource;

impl ResourceMapping for CarTypeResource {
    type Entity = CarType;
    type CreateRequest = CreateCarTypeRequest;
    type UpdateRequest = UpdateCarTypeRequest;
    type Response = CarTypeResponse;

    fn to_record(request: CreateCarTypeRequest) -> Record {
        Record::new().with("name", request.name)
    }

    fn to_changes(request: UpdateCarTypeRequest) -> Record {
        let mut changes = Record::new();
        changes.set_present("name", request.name);
        changes
    }

    fn to_response(car_type: &CarType) -> CarTypeResponse {
        CarTypeResponse {
            id: car_type.id,
            name: car_type.name.clone(),
            created_at: car_type.created_at,
            updated_at: car_type.updated_at,
        }
    }
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarModelRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(range(min = 1))]
    pub car_type_id: i64,

    #[validate(length(min = 1, max = 20))]
    pub gearbox: String,

    #[validate(range(min = 0.0))]
    pub base_price: f64,

    #[serde(default = "default_available")]
    pub is_available: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarModelRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(range(min = 1))]
    pub car_type_id: Option<i64>,

    #[validate(length(min = 1, max = 20))]
    pub gearbox: Option<String>,

    #[validate(range(min = 0.0))]
    pub base_price: Option<f64>,

    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarModelResponse {
    pub id: i64,
    pub name: String,
    pub car_type_id: i64,
    pub gearbox: String,
    pub base_price: f64,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct CarModelResource;

impl ResourceMapping for CarModelResource {
    type Entity = CarModel;
    type CreateRequest = CreateCarModelRequest;
    type UpdateRequest = UpdateCarModelRequest;
    type Response = CarModelResponse;

    fn to_record(request: CreateCarModelRequest) -> Record {
        Record::new()
            .with("name", request.name)
            .with("car_type_id", request.car_type_id)
            .with("gearbox", request.gearbox)
            .with("base_price", request.base_price)
            .with("is_available", request.is_available)
    }

    fn to_changes(request: UpdateCarModelRequest) -> Record {
        let mut changes = Record::new();
        changes.set_present("name", request.name);
        changes.set_present("car_type_id", request.car_type_id);
        changes.set_present("gearbox", request.gearbox);
        changes.set_present("base_price", request.base_price);
        changes.set_present("is_available", request.is_available);
        changes
    }

    fn to_response(model: &CarModel) -> CarModelResponse {
        CarModelResponse {
            id: model.id,
            name: model.name.clone(),
            car_type_id: model.car_type_id,
            gearbox: model.gearbox.clone(),
            base_price: model.base_price,
            is_available: model.is_available,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
