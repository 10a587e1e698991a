//! Identity model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// The authenticated principal acting on the vault.
///
/// Produced by the outer authentication layer (token verification is not
/// this subsystem's concern) and consumed as plain data by the access
/// evaluator and the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique user identifier.
    pub id: Uuid,
    /// Roles held by the user.
    pub roles: HashSet<Role>,
    /// Root folders this user may access directly.
    pub root_folder_ids: HashSet<Uuid>,
}

impl Identity {
    /// Create an identity with the given role set.
    pub fn new(id: Uuid, roles: HashSet<Role>, root_folder_ids: HashSet<Uuid>) -> Self {
        Self {
            id,
            roles,
            root_folder_ids,
        }
    }

    /// An administrator identity with no explicit root grants.
    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            roles: HashSet::from([Role::Admin]),
            root_folder_ids: HashSet::new(),
        }
    }

    /// Whether the identity holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}
