//! File entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata record for one physical file, always owned by exactly one folder.
///
/// `name` is the display name shown to users; the physical file on disk
/// carries a uniquified name, recorded in `storage_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Unique file identifier.
    pub id: Uuid,
    /// The folder owning this file.
    pub folder_id: Uuid,
    /// Display name (including extension).
    pub name: String,
    /// Absolute physical storage location.
    pub storage_path: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// The user who uploaded the file, when known.
    pub created_by: Option<Uuid>,
    /// When the content was last written.
    pub uploaded_at: DateTime<Utc>,
}

impl FileEntry {
    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to create a new file entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileEntry {
    /// The folder to place the file in.
    pub folder_id: Uuid,
    /// Display name.
    pub name: String,
    /// Absolute physical storage location.
    pub storage_path: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// The uploading user, when known.
    pub created_by: Option<Uuid>,
}
