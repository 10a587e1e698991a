//! `AuthUser` extractor — builds the request context from the identity
//! headers injected by the authenticating gateway.
//!
//! Token verification happens upstream; by the time a request reaches
//! this service the gateway has already authenticated the caller and
//! attached `x-user-id`, `x-user-roles` (comma-separated), and
//! `x-root-folders` (comma-separated folder ids).

use std::collections::HashSet;
use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use fleetvault_core::error::AppError;
use fleetvault_entity::identity::{Identity, Role};
use fleetvault_service::context::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing identity header"))?
            .parse::<Uuid>()
            .map_err(|_| ApiError::from(AppError::unauthorized("Invalid identity header")))?;

        let roles: HashSet<Role> = parts
            .headers
            .get("x-user-roles")
            .and_then(|v| v.to_str().ok())
            .map(|s| {
                s.split(',')
                    .filter_map(|r| Role::from_str(r).ok())
                    .collect()
            })
            .unwrap_or_else(|| HashSet::from([Role::Basic]));

        let root_folder_ids: HashSet<Uuid> = parts
            .headers
            .get("x-root-folders")
            .and_then(|v| v.to_str().ok())
            .map(|s| {
                s.split(',')
                    .filter_map(|id| id.trim().parse::<Uuid>().ok())
                    .collect()
            })
            .unwrap_or_default();

        let identity = Identity::new(user_id, roles, root_folder_ids);
        Ok(AuthUser(RequestContext::new(identity)))
    }
}
