//! Color DTOs and their mapping to the stored entity.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::application::services::ResourceMapping;
use crate::domain::entities::Color;
use crate::domain::query::Record;

static HEX_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateColorRequest {
    #[validate(length(min = 2, max = 15))]
    pub name: String,

    /// `#RRGGBB`
    #[validate(regex(path = *HEX_COLOR_REGEX, message = "Must be a #RRGGBB color"))]
    pub hex_code: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColorRequest {
    #[validate(length(min = 2, max = 15))]
    pub name: Option<String>,

    #[validate(regex(path = *HEX_COLOR_REGEX, message = "Must be a #RRGGBB color"))]
    pub hex_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorResponse {
    pub id: i64,
    pub name: String,
    pub hex_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Binds [`Color`] to its DTOs.
pub struct ColorResource;

impl ResourceMapping for ColorResource {
    type Entity = Color;
    type CreateRequest = CreateColorRequest;
    type UpdateRequest = UpdateColorRequest;
    type Response = ColorResponse;

    fn to_record(request: CreateColorRequest) -> Record {
        Record::new()
            .with("name", request.name)
            .with("hex_code", request.hex_code.to_uppercase())
    }

    fn to_changes(request: UpdateColorRequest) -> Record {
        let mut changes = Record::new();
        changes.set_present("name", request.name);
        changes.set_present("hex_code", request.hex_code.map(|h| h.to_uppercase()));
        changes
    }

    fn to_response(color: &Color) -> ColorResponse {
        ColorResponse {
            id: color.id,
            name: color.name.clone(),
            hex_code: color.hex_code.clone(),
            created_at: color.created_at,
            updated_at: color.updated_at,
        }
    }
}
