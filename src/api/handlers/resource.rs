//! Generic handlers shared by every catalog resource.
//!
//! Each handler is instantiated per [`ResourceMapping`] in
//! [`crate::api::routes::resource_routes`]; the service is pulled from the
//! application state through `FromRef`.

use axum::{Json, extract::State, http::StatusCode};
use serde::de::DeserializeOwned;

use crate::api::dto::{BaseResponse, PaginationInputWithFilter};
use crate::api::extract::{Actor, IdPath, JsonBody};
use crate::application::services::{ResourceMapping, ResourceService};
use crate::domain::query::PagedList;
use crate::error::AppError;

/// `POST /{resource}`
///
/// # Response Codes
///
/// - **201 Created**: Entity persisted, body carries the new entity
/// - **400 Bad Request**: Malformed body or failed validation
/// - **409 Conflict**: A unique field is already taken
pub async fn create<M>(
    State(service): State<ResourceService<M>>,
    Actor(ctx): Actor,
    JsonBody(request): JsonBody<M::CreateRequest>,
) -> Result<(StatusCode, Json<BaseResponse<M::Response>>), AppError>
where
    M: ResourceMapping,
    M::CreateRequest: DeserializeOwned,
{
    let created = service.create(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(BaseResponse::ok(created))))
}

/// `PUT /{resource}/{id}`
///
/// Partial update: absent fields keep their stored values.
pub async fn update<M>(
    State(service): State<ResourceService<M>>,
    Actor(ctx): Actor,
    IdPath(id): IdPath,
    JsonBody(request): JsonBody<M::UpdateRequest>,
) -> Result<Json<BaseResponse<M::Response>>, AppError>
where
    M: ResourceMapping,
    M::UpdateRequest: DeserializeOwned,
{
    let updated = service.update(&ctx, id, request).await?;
    Ok(Json(BaseResponse::ok(updated)))
}

/// `DELETE /{resource}/{id}`
pub async fn delete<M: ResourceMapping>(
    State(service): State<ResourceService<M>>,
    Actor(ctx): Actor,
    IdPath(id): IdPath,
) -> Result<Json<BaseResponse<()>>, AppError> {
    service.delete(&ctx, id).await?;
    Ok(Json(BaseResponse::ok(())))
}

/// `GET /{resource}/{id}`
pub async fn get_by_id<M: ResourceMapping>(
    State(service): State<ResourceService<M>>,
    IdPath(id): IdPath,
) -> Result<Json<BaseResponse<M::Response>>, AppError> {
    let entity = service.get_by_id(id).await?;
    Ok(Json(BaseResponse::ok(entity)))
}

/// `POST /{resource}/get-by-filter`
///
/// # Request Body
///
/// See [`PaginationInputWithFilter`]. An empty object returns the first page
/// of everything in default order.
pub async fn get_by_filter<M: ResourceMapping>(
    State(service): State<ResourceService<M>>,
    JsonBody(input): JsonBody<PaginationInputWithFilter>,
) -> Result<Json<BaseResponse<PagedList<M::Response>>>, AppError> {
    let page = input.page()?;
    let list = service
        .get_by_filter(page, &input.filters, &input.sort)
        .await?;
    Ok(Json(BaseResponse::ok(list)))
}
