//! Folder CRUD, tree upload, and cascade delete with access enforcement.
//!
//! Ordering contract: for create/rename/move the physical directory is
//! mutated first and the catalog only on success, so a disk failure
//! leaves no dangling record. Delete inverts this — records always go,
//! physical leftovers are reported as orphans.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use fleetvault_auth::access::{AccessEvaluator, AccessMode};
use fleetvault_catalog::{FileCatalog, FolderCatalog};
use fleetvault_core::error::AppError;
use fleetvault_core::result::AppResult;
use fleetvault_core::types::pagination::{PageRequest, PageResponse};
use fleetvault_entity::file::FileEntry;
use fleetvault_entity::folder::{CreateFolder, Folder};
use fleetvault_storage::local::{LocalVault, sanitize_file_name};

use crate::context::RequestContext;
use crate::file::service::{FileService, UploadFailure, UploadedFile};

/// Request to create a new folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for root-level).
    pub parent_id: Option<Uuid>,
    /// Users explicitly granted access.
    #[serde(default)]
    pub granted_user_ids: HashSet<Uuid>,
}

/// A folder with its direct children and files.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FolderDetail {
    /// The folder itself.
    pub folder: Folder,
    /// Direct subfolders.
    pub subfolders: Vec<Folder>,
    /// Files directly inside the folder.
    pub files: Vec<FileEntry>,
}

/// Result of a cascade delete.
#[derive(Debug, Clone, serde::Serialize, Default)]
pub struct FolderDeleteReport {
    /// Folder records removed (including the target itself).
    pub deleted_folders: usize,
    /// File records removed.
    pub deleted_files: usize,
    /// Physical paths that could not be removed and remain on disk.
    pub orphaned_paths: Vec<String>,
}

/// One file of a directory-structure upload: a relative path with `/`
/// separators plus its content.
#[derive(Debug, Clone)]
pub struct TreeUploadFile {
    /// Path relative to the target folder, e.g. `manuals/2024/spec.pdf`.
    pub relative_path: String,
    /// File content.
    pub bytes: bytes::Bytes,
}

/// Result of a directory-structure upload.
#[derive(Debug, Clone, serde::Serialize, Default)]
pub struct TreeUploadReport {
    /// File entries persisted.
    pub saved: Vec<FileEntry>,
    /// Entries that failed, with reasons.
    pub failures: Vec<UploadFailure>,
    /// Folders created along the way (existing ones are reused silently).
    pub created_folders: usize,
}

/// Manages the folder hierarchy.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Folder store.
    folders: Arc<FolderCatalog>,
    /// File store (cascades and path rewrites).
    files: Arc<FileCatalog>,
    /// Access evaluator.
    access: Arc<AccessEvaluator>,
    /// Physical vault.
    vault: Arc<LocalVault>,
    /// File service (tree upload stores files through it).
    file_service: Arc<FileService>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        folders: Arc<FolderCatalog>,
        files: Arc<FileCatalog>,
        access: Arc<AccessEvaluator>,
        vault: Arc<LocalVault>,
        file_service: Arc<FileService>,
    ) -> Self {
        Self {
            folders,
            files,
            access,
            vault,
            file_service,
        }
    }

    /// Lists root folders. Admins see every root; other identities only
    /// the roots in their accessible set.
    pub fn list_root_folders(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> PageResponse<Folder> {
        if ctx.is_admin() {
            self.folders.find_roots(None, page)
        } else {
            self.folders
                .find_roots(Some(&ctx.identity.root_folder_ids), page)
        }
    }

    /// Lists direct subfolders of a folder, paged and sorted.
    pub fn list_subfolders(
        &self,
        ctx: &RequestContext,
        parent_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Folder>> {
        self.folder_with_access(ctx, parent_id, AccessMode::Read)?;
        Ok(self.folders.find_children(parent_id, page))
    }

    /// Gets a folder with its direct children and files.
    pub fn get_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<FolderDetail> {
        let folder = self.folder_with_access(ctx, folder_id, AccessMode::Read)?;
        Ok(FolderDetail {
            subfolders: self.folders.children_of(folder_id),
            files: self.files.list_in_folder(folder_id),
            folder,
        })
    }

    /// Case-insensitive folder search, restricted to folders the
    /// identity can read.
    pub fn search_folders(
        &self,
        ctx: &RequestContext,
        fragment: &str,
        page: &PageRequest,
    ) -> PageResponse<Folder> {
        let mut matches: Vec<Folder> = self
            .folders
            .search_by_name(fragment)
            .into_iter()
            .filter(|f| self.access.can_access(&ctx.identity, f.id, AccessMode::Read))
            .collect();
        FolderCatalog::sort(&mut matches, page);
        PageResponse::paginate(matches, page)
    }

    /// Creates a new folder, root-level or nested.
    ///
    /// The physical directory is created before the record; an explicit
    /// duplicate name is a `Conflict`.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        let name = validated_name(&req.name)?;

        let path = if let Some(parent_id) = req.parent_id {
            let parent = self.folder_with_access(ctx, parent_id, AccessMode::Write)?;
            format!("{}/{name}", parent.path)
        } else {
            format!("/{name}")
        };

        if self
            .folders
            .find_by_parent_and_name(req.parent_id, &name)
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A folder named '{name}' already exists at this location"
            )));
        }

        self.vault.create_dir(&path).await?;

        let folder = self.folders.insert(CreateFolder {
            parent_id: req.parent_id,
            name,
            path,
            granted_user_ids: req.granted_user_ids,
            created_by: Some(ctx.user_id()),
        })?;

        info!(
            user_id = %ctx.user_id(),
            folder_id = %folder.id,
            path = %folder.path,
            "Folder created"
        );

        Ok(folder)
    }

    /// Renames a folder; a no-op when the name is unchanged.
    ///
    /// The directory rename moves the whole physical subtree in one
    /// operation, so descendant updates are pure record bookkeeping.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        let folder = self.folder_with_access(ctx, folder_id, AccessMode::Write)?;
        if folder.name == new_name {
            return Ok(folder);
        }
        let new_name = validated_name(new_name)?;

        if self
            .folders
            .find_by_parent_and_name(folder.parent_id, &new_name)
            .is_some_and(|other| other.id != folder_id)
        {
            return Err(AppError::conflict(format!(
                "A folder named '{new_name}' already exists at this location"
            )));
        }

        let old_path = folder.path.clone();
        let new_path = sibling_path(&old_path, &new_name);

        self.vault.move_dir(&old_path, &new_path).await?;

        let renamed = self.folders.rename(folder_id, &new_name, &new_path)?;
        self.rewrite_file_locations(&old_path, &new_path);

        info!(
            user_id = %ctx.user_id(),
            folder_id = %folder_id,
            old = %old_path,
            new = %new_path,
            "Folder renamed"
        );

        Ok(renamed)
    }

    /// Moves a folder under a new parent.
    ///
    /// Moving into itself or any of its descendants is rejected; a
    /// destination collision fails with `Conflict` (folders never
    /// auto-rename, unlike file moves).
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        destination_parent_id: Uuid,
    ) -> AppResult<Folder> {
        if folder_id == destination_parent_id {
            return Err(AppError::validation("Cannot move a folder into itself"));
        }
        if self
            .folders
            .is_self_or_descendant(destination_parent_id, folder_id)
        {
            return Err(AppError::validation(
                "Cannot move a folder into one of its descendants",
            ));
        }

        let folder = self.folder_with_access(ctx, folder_id, AccessMode::Write)?;
        let destination =
            self.folder_with_access(ctx, destination_parent_id, AccessMode::Write)?;

        if self
            .folders
            .find_by_parent_and_name(Some(destination_parent_id), &folder.name)
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists in the destination",
                folder.name
            )));
        }

        let old_path = folder.path.clone();
        let new_path = format!("{}/{}", destination.path, folder.name);

        self.vault.move_dir(&old_path, &new_path).await?;

        let moved = self
            .folders
            .reparent(folder_id, destination_parent_id, &new_path)?;
        self.rewrite_file_locations(&old_path, &new_path);

        info!(
            user_id = %ctx.user_id(),
            folder_id = %folder_id,
            destination = %destination_parent_id,
            "Folder moved"
        );

        Ok(moved)
    }

    /// Deletes a folder and its whole subtree.
    ///
    /// Records are always removed; physical deletes are best-effort and
    /// surviving paths are returned for operator reconciliation.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<FolderDeleteReport> {
        let folder = self.folder_with_access(ctx, folder_id, AccessMode::Write)?;

        let mut report = FolderDeleteReport::default();
        let descendants = self.folders.find_descendants(folder_id);

        for node in descendants.iter().chain(std::iter::once(&folder)) {
            self.delete_folder_files(node.id, &mut report).await;
        }

        // Records bottom-up, children before parents.
        for node in descendants.iter().rev() {
            if self.folders.remove(node.id).is_some() {
                report.deleted_folders += 1;
            }
        }
        if self.folders.remove(folder_id).is_some() {
            report.deleted_folders += 1;
        }

        if let Err(e) = self.vault.delete_dir(&folder.path).await {
            warn!(path = %folder.path, error = %e, "Physical directory delete failed");
            report
                .orphaned_paths
                .push(self.vault.dir_path(&folder.path).to_string_lossy().to_string());
        }

        info!(
            user_id = %ctx.user_id(),
            folder_id = %folder_id,
            path = %folder.path,
            folders = report.deleted_folders,
            files = report.deleted_files,
            "Folder deleted"
        );

        Ok(report)
    }

    /// Creates subfolders and files from a directory-structure upload.
    ///
    /// Relative paths use `/` separators; intermediate folders are
    /// created idempotently, so concurrent uploads of the same tree
    /// converge instead of erroring on duplicates.
    pub async fn upload_tree(
        &self,
        ctx: &RequestContext,
        parent_id: Uuid,
        uploads: Vec<TreeUploadFile>,
    ) -> AppResult<TreeUploadReport> {
        if uploads.is_empty() {
            return Err(AppError::validation("No files to upload"));
        }
        let parent = self.folder_with_access(ctx, parent_id, AccessMode::Write)?;

        let mut report = TreeUploadReport::default();
        for upload in uploads {
            let relative = upload.relative_path.replace('\\', "/");
            let mut segments: Vec<&str> = relative
                .split('/')
                .filter(|s| !s.is_empty() && *s != ".")
                .collect();
            let Some(file_name) = segments.pop() else {
                continue;
            };
            if upload.bytes.is_empty() {
                continue;
            }

            let target = match self
                .descend_or_create(ctx, &parent, &segments, &mut report)
                .await
            {
                Ok(folder) => folder,
                Err(e) => {
                    report.failures.push(UploadFailure {
                        name: relative.clone(),
                        reason: e.message.clone(),
                    });
                    continue;
                }
            };

            let file = UploadedFile {
                name: file_name.to_string(),
                bytes: upload.bytes,
            };
            match self.file_service.upload(ctx, target.id, file).await {
                Ok(entry) => report.saved.push(entry),
                Err(e) => {
                    warn!(path = %relative, error = %e, "Tree upload entry failed");
                    report.failures.push(UploadFailure {
                        name: relative,
                        reason: e.message.clone(),
                    });
                }
            }
        }

        info!(
            user_id = %ctx.user_id(),
            parent_id = %parent_id,
            saved = report.saved.len(),
            failed = report.failures.len(),
            created_folders = report.created_folders,
            "Tree upload finished"
        );

        Ok(report)
    }

    /// Replaces a folder's content with a freshly uploaded tree: the
    /// existing files and subfolders go away (best-effort physically),
    /// then the upload is applied to the emptied folder.
    pub async fn substitute_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        uploads: Vec<TreeUploadFile>,
    ) -> AppResult<TreeUploadReport> {
        if uploads.is_empty() {
            return Err(AppError::validation("No files to upload"));
        }
        let folder = self.folder_with_access(ctx, folder_id, AccessMode::Write)?;

        let mut purge = FolderDeleteReport::default();
        self.delete_folder_files(folder_id, &mut purge).await;

        let children = self.folders.children_of(folder_id);
        for child in &children {
            let descendants = self.folders.find_descendants(child.id);
            for node in &descendants {
                self.delete_folder_files(node.id, &mut purge).await;
            }
            for node in descendants.iter().rev() {
                self.folders.remove(node.id);
            }
            self.folders.remove(child.id);
            if let Err(e) = self.vault.delete_dir(&child.path).await {
                warn!(path = %child.path, error = %e, "Physical directory delete failed");
                purge
                    .orphaned_paths
                    .push(self.vault.dir_path(&child.path).to_string_lossy().to_string());
            }
        }

        info!(
            user_id = %ctx.user_id(),
            folder_id = %folder_id,
            path = %folder.path,
            purged_files = purge.deleted_files,
            "Folder content purged for substitution"
        );

        let mut report = self.upload_tree(ctx, folder_id, uploads).await?;
        report
            .failures
            .extend(purge.orphaned_paths.into_iter().map(|p| UploadFailure {
                name: p,
                reason: "previous content could not be removed from disk".to_string(),
            }));
        Ok(report)
    }

    /// Best-effort physical delete of a folder's files, always removing
    /// the records.
    async fn delete_folder_files(&self, folder_id: Uuid, report: &mut FolderDeleteReport) {
        for entry in self.files.list_in_folder(folder_id) {
            let location = std::path::PathBuf::from(&entry.storage_path);
            if let Err(e) = self.vault.delete_file(&location).await {
                warn!(
                    file_id = %entry.id,
                    location = %location.display(),
                    error = %e,
                    "Physical file delete failed, record removed anyway"
                );
                report.orphaned_paths.push(entry.storage_path.clone());
            }
            if self.files.remove(entry.id).is_some() {
                report.deleted_files += 1;
            }
        }
    }

    /// Walks `segments` below `parent`, creating missing folders on disk
    /// and in the catalog as it goes.
    async fn descend_or_create(
        &self,
        ctx: &RequestContext,
        parent: &Folder,
        segments: &[&str],
        report: &mut TreeUploadReport,
    ) -> AppResult<Folder> {
        let mut current = parent.clone();
        for segment in segments {
            let name = sanitize_file_name(segment);
            let path = format!("{}/{name}", current.path);
            self.vault.create_dir(&path).await?;
            let (folder, created) = self.folders.get_or_insert(CreateFolder {
                parent_id: Some(current.id),
                name,
                path,
                granted_user_ids: HashSet::new(),
                created_by: Some(ctx.user_id()),
            });
            if created {
                report.created_folders += 1;
            }
            current = folder;
        }
        Ok(current)
    }

    /// Record-side rewrite of file storage locations after a directory
    /// was renamed or moved on disk.
    fn rewrite_file_locations(&self, old_virtual: &str, new_virtual: &str) {
        let old_physical = self.vault.dir_path(old_virtual).to_string_lossy().to_string();
        let new_physical = self.vault.dir_path(new_virtual).to_string_lossy().to_string();
        self.files
            .rewrite_storage_prefix(&old_physical, &new_physical);
    }

    fn folder_with_access(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        mode: AccessMode,
    ) -> AppResult<Folder> {
        let folder = self
            .folders
            .find_by_id(folder_id)
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        self.access.require_access(&ctx.identity, folder_id, mode)?;
        Ok(folder)
    }
}

/// Reject empty names and names that would change the directory layout.
fn validated_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Folder name cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(AppError::validation(
            "Folder name cannot contain path separators",
        ));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation("Folder name is reserved"));
    }
    Ok(name.to_string())
}

/// Replace the last segment of a virtual path.
fn sibling_path(path: &str, new_name: &str) -> String {
    match path.rfind('/') {
        Some(idx) => format!("{}/{new_name}", &path[..idx]),
        None => format!("/{new_name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_path_replaces_last_segment() {
        assert_eq!(sibling_path("/a/b/c", "d"), "/a/b/d");
        assert_eq!(sibling_path("/root", "renamed"), "/renamed");
    }

    #[test]
    fn validated_name_rejects_separators_and_dots() {
        assert!(validated_name("ok name").is_ok());
        assert!(validated_name("").is_err());
        assert!(validated_name("  ").is_err());
        assert!(validated_name("a/b").is_err());
        assert!(validated_name("..").is_err());
    }
}
