//! Request DTOs with validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Folder name is required"))]
    pub name: String,
    /// Parent folder ID (absent for root folders).
    pub parent_id: Option<Uuid>,
    /// Users explicitly granted access.
    #[serde(default)]
    pub granted_user_ids: HashSet<Uuid>,
}

/// Rename folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameFolderRequest {
    /// New folder name.
    #[validate(length(min = 1, max = 255, message = "Folder name is required"))]
    pub name: String,
}

/// Move folder request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFolderRequest {
    /// Destination parent folder ID.
    pub destination_parent_id: Uuid,
}

/// Rename file request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameFileRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub name: String,
}

/// Move file request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFileRequest {
    /// Destination folder ID.
    pub destination_folder_id: Uuid,
}

/// Copy file request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFileRequest {
    /// Destination folder ID.
    pub destination_folder_id: Uuid,
}

/// Bulk file delete request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeleteFilesRequest {
    /// IDs of the files to delete.
    #[validate(length(min = 1, message = "At least one file id is required"))]
    pub file_ids: Vec<Uuid>,
}
