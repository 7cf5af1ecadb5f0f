//! Per-request context handed to services.

use crate::domain::identity::Identity;

/// Who is acting on behalf of the current request.
///
/// Carried explicitly through service calls; stores use the actor id for the
/// `created_by` / `updated_by` / `deleted_by` audit columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub actor_id: Option<i64>,
}

impl RequestContext {
    /// Context for work not triggered by an authenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_identity(identity: Option<&Identity>) -> Self {
        Self {
            actor_id: identity.map(|i| i.user_id),
        }
    }
}
