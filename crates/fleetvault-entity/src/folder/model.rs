//! Folder entity model.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A folder in the virtual document hierarchy.
///
/// Each folder is mirrored by a physical directory under the configured
/// storage root; `path` is the virtual path whose segments are the folder
/// names from the root down to this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Full materialized virtual path (e.g. `/manuals/2024`).
    pub path: String,
    /// Users explicitly granted access to this folder, independent of
    /// the hierarchy.
    #[serde(default)]
    pub granted_user_ids: HashSet<Uuid>,
    /// The user who created the folder, when known.
    pub created_by: Option<Uuid>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Parent folder (None for root).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Full materialized virtual path.
    pub path: String,
    /// Explicit access grants.
    #[serde(default)]
    pub granted_user_ids: HashSet<Uuid>,
    /// The creating user, when known.
    pub created_by: Option<Uuid>,
}
