//! File CRUD with access enforcement and physical-first ordering.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use fleetvault_auth::access::{AccessEvaluator, AccessMode};
use fleetvault_catalog::{FileCatalog, FolderCatalog};
use fleetvault_core::error::AppError;
use fleetvault_core::result::AppResult;
use fleetvault_core::types::pagination::{PageRequest, PageResponse};
use fleetvault_entity::file::{CreateFileEntry, FileEntry};
use fleetvault_entity::folder::Folder;
use fleetvault_storage::local::{ByteStream, LocalVault, mime_from_path};

use crate::context::RequestContext;

/// One uploaded file payload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Display name (as sent by the client).
    pub name: String,
    /// File content.
    pub bytes: Bytes,
}

/// One failed entry of a batch upload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadFailure {
    /// The display name that failed.
    pub name: String,
    /// Why it failed.
    pub reason: String,
}

/// Result of a batch upload; partial success is allowed.
#[derive(Debug, Clone, serde::Serialize, Default)]
pub struct BatchUploadOutcome {
    /// Entries persisted successfully.
    pub saved: Vec<FileEntry>,
    /// Entries that failed, with reasons.
    pub failures: Vec<UploadFailure>,
}

/// Result of a bulk file delete.
#[derive(Debug, Clone, serde::Serialize, Default)]
pub struct FileDeleteReport {
    /// Number of records removed.
    pub deleted: usize,
    /// Physical locations that could not be removed and remain on disk.
    pub orphaned_paths: Vec<String>,
}

/// Handles file CRUD with per-folder access checks.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File entry store.
    files: Arc<FileCatalog>,
    /// Folder store (for owning-folder lookups).
    folders: Arc<FolderCatalog>,
    /// Access evaluator.
    access: Arc<AccessEvaluator>,
    /// Physical vault.
    vault: Arc<LocalVault>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        files: Arc<FileCatalog>,
        folders: Arc<FolderCatalog>,
        access: Arc<AccessEvaluator>,
        vault: Arc<LocalVault>,
    ) -> Self {
        Self {
            files,
            folders,
            access,
            vault,
        }
    }

    /// Uploads a single file into a folder.
    ///
    /// The physical file gets a fresh unique name so display-name
    /// collisions inside a folder can never clobber bytes on disk.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        file: UploadedFile,
    ) -> AppResult<FileEntry> {
        if file.name.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }

        let folder = self.writable_folder(ctx, folder_id)?;

        let physical_name = LocalVault::unique_file_name(&file.name);
        let location = self
            .vault
            .write_file(&folder.path, &physical_name, &file.bytes)
            .await?;

        let entry = self.files.insert(CreateFileEntry {
            folder_id,
            name: file.name,
            storage_path: location.to_string_lossy().to_string(),
            size_bytes: file.bytes.len() as u64,
            created_by: Some(ctx.user_id()),
        });

        info!(
            user_id = %ctx.user_id(),
            file_id = %entry.id,
            folder_id = %folder_id,
            bytes = entry.size_bytes,
            "File uploaded"
        );

        Ok(entry)
    }

    /// Uploads several files into a folder; empty payloads are skipped
    /// and individual failures do not roll back earlier successes.
    pub async fn upload_many(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> AppResult<BatchUploadOutcome> {
        // Fail the whole batch up front when the folder itself is off-limits.
        self.writable_folder(ctx, folder_id)?;

        let mut outcome = BatchUploadOutcome::default();
        for file in files {
            if file.bytes.is_empty() {
                continue;
            }
            let name = file.name.clone();
            match self.upload(ctx, folder_id, file).await {
                Ok(entry) => outcome.saved.push(entry),
                Err(e) => {
                    warn!(file = %name, error = %e, "Batch upload entry failed");
                    outcome.failures.push(UploadFailure {
                        name,
                        reason: e.message.clone(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Gets a single file's record, enforcing read access on its folder.
    pub fn get_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<FileEntry> {
        self.file_with_access(ctx, file_id, AccessMode::Read)
    }

    /// Lists files in a folder, paged and sorted.
    pub fn list_files(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<FileEntry>> {
        self.folder_with_access(ctx, folder_id, AccessMode::Read)?;
        Ok(self.files.find_by_folder(folder_id, page))
    }

    /// Renames a file (metadata only; the physical name is untouched).
    pub fn rename(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        new_name: &str,
    ) -> AppResult<FileEntry> {
        if new_name.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }

        let mut entry = self.file_with_access(ctx, file_id, AccessMode::Write)?;
        entry.name = new_name.to_string();
        let entry = self.files.update(entry)?;

        info!(user_id = %ctx.user_id(), file_id = %file_id, "File renamed");
        Ok(entry)
    }

    /// Replaces a file's content: old bytes removed, replacement written
    /// under a fresh unique name, record updated in place.
    pub async fn replace_content(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        replacement: UploadedFile,
    ) -> AppResult<FileEntry> {
        if replacement.name.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }

        let mut entry = self.file_with_access(ctx, file_id, AccessMode::Write)?;
        let folder = self
            .folders
            .find_by_id(entry.folder_id)
            .ok_or_else(|| AppError::not_found("Owning folder not found"))?;

        self.vault
            .delete_file(Path::new(&entry.storage_path))
            .await?;

        let physical_name = LocalVault::unique_file_name(&replacement.name);
        let location = self
            .vault
            .write_file(&folder.path, &physical_name, &replacement.bytes)
            .await?;

        entry.name = replacement.name;
        entry.storage_path = location.to_string_lossy().to_string();
        entry.size_bytes = replacement.bytes.len() as u64;
        entry.uploaded_at = Utc::now();
        let entry = self.files.update(entry)?;

        info!(user_id = %ctx.user_id(), file_id = %file_id, "File content replaced");
        Ok(entry)
    }

    /// Moves a file into another folder.
    ///
    /// The physical file always lands under a fresh unique name, so a
    /// destination collision resolves itself instead of failing — the
    /// deliberate opposite of the folder-move policy.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        destination_folder_id: Uuid,
    ) -> AppResult<FileEntry> {
        let mut entry = self.file_with_access(ctx, file_id, AccessMode::Write)?;
        let destination = self.writable_folder(ctx, destination_folder_id)?;

        let physical_name = LocalVault::unique_file_name(&entry.name);
        let location = self
            .vault
            .move_file_to(
                Path::new(&entry.storage_path),
                &destination.path,
                &physical_name,
            )
            .await?;

        let old_folder = entry.folder_id;
        entry.folder_id = destination_folder_id;
        entry.storage_path = location.to_string_lossy().to_string();
        let entry = self.files.update(entry)?;

        info!(
            user_id = %ctx.user_id(),
            file_id = %file_id,
            from_folder = %old_folder,
            to_folder = %destination_folder_id,
            "File moved"
        );

        Ok(entry)
    }

    /// Copies a file into another folder; the source is untouched.
    pub async fn copy_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        destination_folder_id: Uuid,
    ) -> AppResult<FileEntry> {
        let source = self.file_with_access(ctx, file_id, AccessMode::Read)?;
        let destination = self.writable_folder(ctx, destination_folder_id)?;

        let physical_name = LocalVault::unique_file_name(&source.name);
        let location = self
            .vault
            .copy_file_to(
                Path::new(&source.storage_path),
                &destination.path,
                &physical_name,
            )
            .await?;

        let copy = self.files.insert(CreateFileEntry {
            folder_id: destination_folder_id,
            name: source.name.clone(),
            storage_path: location.to_string_lossy().to_string(),
            size_bytes: source.size_bytes,
            created_by: Some(ctx.user_id()),
        });

        info!(
            user_id = %ctx.user_id(),
            source_id = %file_id,
            new_id = %copy.id,
            "File copied"
        );

        Ok(copy)
    }

    /// Deletes one file: physical best-effort, record always removed.
    pub async fn delete_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<FileDeleteReport> {
        let entry = self.file_with_access(ctx, file_id, AccessMode::Write)?;
        let mut report = FileDeleteReport::default();
        self.delete_physical_then_record(&entry, &mut report).await;

        info!(user_id = %ctx.user_id(), file_id = %file_id, "File deleted");
        Ok(report)
    }

    /// Deletes several files by id. Access is verified per file (the ids
    /// may span folders with different grants) before anything is removed.
    pub async fn delete_many(
        &self,
        ctx: &RequestContext,
        file_ids: &[Uuid],
    ) -> AppResult<FileDeleteReport> {
        let entries = self.files.find_by_ids(file_ids);
        if entries.is_empty() {
            return Err(AppError::not_found("No files found for the given ids"));
        }

        for entry in &entries {
            self.access
                .require_access(&ctx.identity, entry.folder_id, AccessMode::Write)?;
        }

        let mut report = FileDeleteReport::default();
        for entry in &entries {
            self.delete_physical_then_record(entry, &mut report).await;
        }

        info!(
            user_id = %ctx.user_id(),
            deleted = report.deleted,
            orphaned = report.orphaned_paths.len(),
            "Files bulk-deleted"
        );
        Ok(report)
    }

    /// Deletes every file in a folder. An empty folder is a successful no-op.
    pub async fn delete_all_in_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<FileDeleteReport> {
        self.writable_folder(ctx, folder_id)?;

        let entries = self.files.list_in_folder(folder_id);
        let mut report = FileDeleteReport::default();
        for entry in &entries {
            self.delete_physical_then_record(entry, &mut report).await;
        }

        info!(
            user_id = %ctx.user_id(),
            folder_id = %folder_id,
            deleted = report.deleted,
            "Folder files deleted"
        );
        Ok(report)
    }

    /// Case-insensitive substring search, restricted to files whose
    /// owning folder the identity can read.
    pub fn search(
        &self,
        ctx: &RequestContext,
        fragment: &str,
        page: &PageRequest,
    ) -> AppResult<PageResponse<FileEntry>> {
        let mut matches: Vec<FileEntry> = self
            .files
            .search_by_name(fragment)
            .into_iter()
            .filter(|e| {
                self.access
                    .can_access(&ctx.identity, e.folder_id, AccessMode::Read)
            })
            .collect();

        FileCatalog::sort(&mut matches, page);
        Ok(PageResponse::paginate(matches, page))
    }

    /// Opens a file for attachment download.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<(FileEntry, ByteStream)> {
        let entry = self.file_with_access(ctx, file_id, AccessMode::Read)?;
        let stream = self
            .vault
            .read_stream(Path::new(&entry.storage_path))
            .await?;
        Ok((entry, stream))
    }

    /// Opens a file for inline viewing, sniffing the content type from
    /// the display name.
    pub async fn view(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<(FileEntry, ByteStream, String)> {
        let (entry, stream) = self.download(ctx, file_id).await?;
        let mime =
            mime_from_path(&entry.name).unwrap_or_else(|| "application/octet-stream".to_string());
        Ok((entry, stream, mime))
    }

    /// Best-effort physical delete followed by unconditional record
    /// removal; failures land in the report instead of aborting.
    async fn delete_physical_then_record(&self, entry: &FileEntry, report: &mut FileDeleteReport) {
        let location = PathBuf::from(&entry.storage_path);
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
            report.deleted += 1;
        }
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

    fn writable_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        self.folder_with_access(ctx, folder_id, AccessMode::Write)
    }

    fn file_with_access(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        mode: AccessMode,
    ) -> AppResult<FileEntry> {
        let entry = self
            .files
            .find_by_id(file_id)
            .ok_or_else(|| AppError::not_found("File not found"))?;
        self.access
            .require_access(&ctx.identity, entry.folder_id, mode)?;
        Ok(entry)
    }
}
