//! Ordered admission gates in front of a route's handler.
//!
//! A route declares its gates as a [`GateChain`]; [`layer`] runs them in
//! declaration order and short-circuits on the first failure, so no later
//! gate and no handler ever sees a rejected request.
//!
//! ```rust,ignore
//! let chain = GateChain::new()
//!     .then(AuthenticationGate::new(tokens))
//!     .then(AuthorizationGate::new([ADMIN_ROLE]));
//!
//! let routes = Router::new()
//!     .route("/colors", post(create))
//!     .route_layer(middleware::from_fn_with_state(chain, chain::layer));
//! ```

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::AppError;

/// One admission step.
///
/// A gate may read and extend the request parts (e.g. attach the caller
/// identity to the extensions) and either lets the request continue or
/// rejects it with an error.
#[async_trait]
pub trait Gate: Send + Sync {
    /// Label used in logs and in the `admission_rejections_total` counter.
    fn name(&self) -> &'static str;

    async fn admit(&self, parts: &mut Parts) -> Result<(), AppError>;
}

/// Gates applied to a route, in order.
#[derive(Clone, Default)]
pub struct GateChain {
    gates: Vec<Arc<dyn Gate>>,
}

impl GateChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a gate; it runs after every gate added before it.
    pub fn then(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    /// Appends an already shared gate, e.g. a limiter used by several chains.
    pub fn then_shared(mut self, gate: Arc<dyn Gate>) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.gates.iter().map(|g| g.name()).collect()
    }

    /// Runs every gate in order, stopping at the first rejection.
    ///
    /// # Errors
    ///
    /// Returns the error of the first gate that rejects the request.
    pub async fn admit(&self, parts: &mut Parts) -> Result<(), AppError> {
        for gate in &self.gates {
            if let Err(e) = gate.admit(parts).await {
                metrics::counter!("admission_rejections_total", "gate" => gate.name())
                    .increment(1);
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Middleware entry point for a [`GateChain`].
///
/// # Errors
///
/// Returns the first gate's rejection, rendered through the uniform envelope.
pub async fn layer(
    State(chain): State<GateChain>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    chain.admit(&mut parts).await?;

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}
