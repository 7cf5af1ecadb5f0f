//! Shared application state injected into handlers.

use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::dto::{
    CarModelResource, CarTypeResource, ColorResource, PropertyCategoryResource, PropertyResource,
};
use crate::application::services::{ResourceService, TokenService, UserService};
use crate::infrastructure::cache::CacheService;

/// Services and connections shared by every request.
///
/// Cloning is cheap: every field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<PgPool>,
    pub cache: Arc<dyn CacheService>,
    pub colors: ResourceService<ColorResource>,
    pub property_categories: ResourceService<PropertyCategoryResource>,
    pub properties: ResourceService<PropertyResource>,
    pub car_types: ResourceService<CarTypeResource>,
    pub car_models: ResourceService<CarModelResource>,
    pub users: Arc<UserService>,
    pub tokens: Arc<TokenService>,
    pub metrics: PrometheusHandle,
}

macro_rules! resource_state {
    ($($field:ident => $mapping:ty),+ $(,)?) => {
        $(
            impl FromRef<AppState> for ResourceService<$mapping> {
                fn from_ref(state: &AppState) -> Self {
                    state.$field.clone()
                }
            }
        )+
    };
}

resource_state! {
    colors => ColorResource,
    property_categories => PropertyCategoryResource,
    properties => PropertyResource,
    car_types => CarTypeResource,
    car_models => CarModelResource,
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.users)
    }
}

impl FromRef<AppState> for PrometheusHandle {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
