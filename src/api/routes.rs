//! API route tables.
//!
//! Every catalog resource gets the same five routes from
//! [`resource_routes`]; the gate chain in front of them is declared per
//! resource.
//!
//! # Endpoints (under `/api/v1`)
//!
//! - `GET    /health`
//! - `POST   /{resource}`                - create (201)
//! - `PUT    /{resource}/{id}`           - partial update
//! - `DELETE /{resource}/{id}`           - soft delete
//! - `GET    /{resource}/{id}`           - fetch one
//! - `POST   /{resource}/get-by-filter`  - filtered, paginated list
//! - `POST   /users/send-otp`            - OTP issuance (OTP limiter)
//! - `POST   /users/register-by-username`
//! - `POST   /users/login-by-username`
//! - `POST   /users/login-by-mobile`
//! - `POST   /users/refresh-token`

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::api::dto::{
    CarModelResource, CarTypeResource, ColorResource, PropertyCategoryResource, PropertyResource,
};
use crate::api::handlers::{health_handler, resource, users};
use crate::api::middleware::{
    AuthenticationGate, AuthorizationGate, Gate, GateChain, Limiters, chain,
};
use crate::application::services::{ResourceMapping, ResourceService, TokenService};
use crate::domain::entities::{ADMIN_ROLE, DEFAULT_ROLE};
use crate::state::AppState;

/// The five generic routes of one resource, behind `gates`.
pub fn resource_routes<M>(gates: GateChain) -> Router<AppState>
where
    M: ResourceMapping,
    M::CreateRequest: DeserializeOwned,
    M::UpdateRequest: DeserializeOwned,
    ResourceService<M>: FromRef<AppState>,
{
    Router::new()
        .route("/", post(resource::create::<M>))
        .route("/get-by-filter", post(resource::get_by_filter::<M>))
        .route(
            "/{id}",
            get(resource::get_by_id::<M>)
                .put(resource::update::<M>)
                .delete(resource::delete::<M>),
        )
        .route_layer(middleware::from_fn_with_state(gates, chain::layer))
}

/// Registration and login. Only OTP issuance is gated.
pub fn user_routes(otp_gates: GateChain) -> Router<AppState> {
    let send_otp = Router::new()
        .route("/send-otp", post(users::send_otp))
        .route_layer(middleware::from_fn_with_state(otp_gates, chain::layer));

    Router::new()
        .merge(send_otp)
        .route("/register-by-username", post(users::register_by_username))
        .route("/login-by-username", post(users::login_by_username))
        .route("/login-by-mobile", post(users::login_by_mobile))
        .route("/refresh-token", post(users::refresh_token))
}

/// Everything under `/api`, wrapped in the global per-client limiter.
pub fn api_routes(tokens: Arc<TokenService>, limiters: &Limiters) -> Router<AppState> {
    let authentication: Arc<dyn Gate> = Arc::new(AuthenticationGate::new(tokens));

    let admins = GateChain::new()
        .then_shared(Arc::clone(&authentication))
        .then(AuthorizationGate::new([ADMIN_ROLE]));
    let members = GateChain::new()
        .then_shared(authentication)
        .then(AuthorizationGate::new([ADMIN_ROLE, DEFAULT_ROLE]));

    let v1 = Router::new()
        .route("/health", get(health_handler))
        .nest("/colors", resource_routes::<ColorResource>(admins.clone()))
        .nest(
            "/property-categories",
            resource_routes::<PropertyCategoryResource>(admins.clone()),
        )
        .nest("/properties", resource_routes::<PropertyResource>(admins.clone()))
        .nest("/car-types", resource_routes::<CarTypeResource>(admins))
        .nest("/car-models", resource_routes::<CarModelResource>(members))
        .nest(
            "/users",
            user_routes(GateChain::new().then(limiters.otp_gate())),
        );

    let global = GateChain::new().then(limiters.global_gate());

    Router::new()
        .nest("/v1", v1)
        .layer(middleware::from_fn_with_state(global, chain::layer))
}
