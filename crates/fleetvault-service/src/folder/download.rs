//! Whole-folder zip downloads.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use fleetvault_auth::access::{AccessEvaluator, AccessMode};
use fleetvault_catalog::{FileCatalog, FolderCatalog};
use fleetvault_core::error::AppError;
use fleetvault_core::result::AppResult;
use fleetvault_entity::folder::Folder;
use fleetvault_storage::archive::{ZipBuilder, ZipHandle};

use crate::context::RequestContext;

/// Builds zip archives of folder subtrees for bulk download.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    /// Folder store.
    folders: Arc<FolderCatalog>,
    /// File store.
    files: Arc<FileCatalog>,
    /// Access evaluator.
    access: Arc<AccessEvaluator>,
}

impl ArchiveService {
    /// Creates a new archive service.
    pub fn new(
        folders: Arc<FolderCatalog>,
        files: Arc<FileCatalog>,
        access: Arc<AccessEvaluator>,
    ) -> Self {
        Self {
            folders,
            files,
            access,
        }
    }

    /// Streams a folder subtree into a temporary zip file.
    ///
    /// Every folder contributes a directory entry (empty folders survive
    /// the round trip); files whose physical location disappeared are
    /// skipped rather than failing the archive. The caller drops the
    /// returned handle once the response has been streamed.
    pub fn build_zip(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<ZipHandle> {
        let folder = self
            .folders
            .find_by_id(folder_id)
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        self.access
            .require_access(&ctx.identity, folder_id, AccessMode::Read)?;

        let mut builder = ZipBuilder::new(&folder.name)?;
        self.add_folder(&mut builder, &folder, "")?;
        let handle = builder.finish()?;

        info!(
            user_id = %ctx.user_id(),
            folder_id = %folder_id,
            archive = handle.file_name(),
            "Folder archive built"
        );

        Ok(handle)
    }

    /// Depth-first: the folder's own entry, its files, then subfolders
    /// with an extended prefix.
    fn add_folder(&self, builder: &mut ZipBuilder, folder: &Folder, prefix: &str) -> AppResult<()> {
        let entry_name = if prefix.is_empty() {
            folder.name.clone()
        } else {
            format!("{prefix}/{}", folder.name)
        };
        builder.add_directory(&entry_name)?;

        for file in self.files.list_in_folder(folder.id) {
            let file_entry = format!("{entry_name}/{}", file.name);
            builder.add_file(&file_entry, Path::new(&file.storage_path))?;
        }

        for subfolder in self.folders.children_of(folder.id) {
            self.add_folder(builder, &subfolder, &entry_name)?;
        }

        Ok(())
    }
}
