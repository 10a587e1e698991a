//! Request context carrying the authenticated identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleetvault_entity::identity::Identity;

/// Context for the current authenticated request.
///
/// Built by the HTTP layer from the gateway-verified identity and passed
/// into service methods so every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated identity.
    pub identity: Identity,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            request_time: Utc::now(),
        }
    }

    /// The acting user's id.
    pub fn user_id(&self) -> Uuid {
        self.identity.id
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.identity.is_admin()
    }
}
