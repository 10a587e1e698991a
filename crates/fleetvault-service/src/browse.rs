//! Physical ("on-disk") folder views.
//!
//! The browse surface is path-addressed: user paths resolve inside the
//! storage root with traversal protection, the directory tree is
//! reconciled into the catalog (one-way, disk → records), and the
//! listing is served from what is actually on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use fleetvault_catalog::{FileCatalog, FolderCatalog};
use fleetvault_core::error::AppError;
use fleetvault_core::result::AppResult;
use fleetvault_entity::file::CreateFileEntry;
use fleetvault_entity::folder::{CreateFolder, Folder};
use fleetvault_storage::local::{LocalVault, mime_from_path};

/// One node of a recursive physical listing.
#[derive(Debug, Clone, Serialize)]
pub struct PhysicalItem {
    /// File or directory name.
    pub name: String,
    /// Whether this is a directory.
    pub is_dir: bool,
    /// Size in kilobytes (directories: sum of direct children).
    pub size_kb: f64,
    /// Number of direct children (directories only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_count: Option<usize>,
    /// Nested content (directories only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PhysicalItem>,
}

/// Result of one disk → catalog reconciliation pass.
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct ReconcileReport {
    /// Folder records created.
    pub folders_created: usize,
    /// File records created.
    pub files_created: usize,
}

/// Serves path-addressed views of the physical tree.
#[derive(Debug, Clone)]
pub struct BrowseService {
    /// Folder store.
    folders: Arc<FolderCatalog>,
    /// File store.
    files: Arc<FileCatalog>,
    /// Physical vault.
    vault: Arc<LocalVault>,
}

impl BrowseService {
    /// Creates a new browse service.
    pub fn new(
        folders: Arc<FolderCatalog>,
        files: Arc<FileCatalog>,
        vault: Arc<LocalVault>,
    ) -> Self {
        Self {
            folders,
            files,
            vault,
        }
    }

    /// Lists the physical content under a user-supplied path,
    /// reconciling it into the catalog first. A missing directory yields
    /// an empty listing, matching the tolerant behavior of the portal UI.
    pub async fn browse(&self, user_path: &str) -> AppResult<Vec<PhysicalItem>> {
        let resolved = self.vault.resolve_user_path(user_path)?;
        self.reconcile_resolved(&resolved).await?;

        if !self.vault.exists(&resolved).await {
            return Ok(Vec::new());
        }
        self.list_recursive(&resolved).await
    }

    /// One-way sync of a physical directory tree into the catalog:
    /// records are created for directories and files the catalog does
    /// not know yet; nothing is ever deleted here.
    pub async fn reconcile_from_disk(&self, user_path: &str) -> AppResult<ReconcileReport> {
        let resolved = self.vault.resolve_user_path(user_path)?;
        self.reconcile_resolved(&resolved).await
    }

    /// Resolves a user path for attachment download.
    pub async fn resolve_download(&self, user_path: &str) -> AppResult<(PathBuf, String)> {
        let resolved = self.vault.resolve_user_path(user_path)?;
        if !self.vault.exists(&resolved).await || !resolved.is_file() {
            return Err(AppError::not_found("File not found"));
        }
        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "download".to_string());
        Ok((resolved, name))
    }

    /// Resolves a user path for inline viewing, sniffing the mime type.
    pub async fn resolve_view(&self, user_path: &str) -> AppResult<(PathBuf, String)> {
        let (resolved, name) = self.resolve_download(user_path).await?;
        let mime = mime_from_path(&name).unwrap_or_else(|| "application/octet-stream".to_string());
        Ok((resolved, mime))
    }

    async fn reconcile_resolved(&self, resolved: &Path) -> AppResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        if !self.vault.exists(resolved).await || !resolved.is_dir() {
            return Ok(report);
        }

        let anchor = self.ensure_folder_chain(resolved, &mut report)?;

        // Iterative walk; each physical directory is paired with its
        // catalog folder id.
        let mut stack: Vec<(PathBuf, Option<Folder>)> = vec![(resolved.to_path_buf(), anchor)];
        while let Some((dir, folder)) = stack.pop() {
            for entry in self.vault.scan_dir(&dir).await? {
                if entry.is_dir {
                    let child = match &folder {
                        Some(parent) => self.get_or_insert_child(parent, &entry.name, &mut report),
                        // Scanning the storage root itself: top-level
                        // directories become root folders.
                        None => self.get_or_insert_root(&entry.name, &mut report),
                    };
                    stack.push((entry.path, Some(child)));
                } else if let Some(parent) = &folder {
                    let location = entry.path.to_string_lossy().to_string();
                    if self.files.find_by_storage_path(&location).is_none() {
                        self.files.insert(CreateFileEntry {
                            folder_id: parent.id,
                            name: entry.name.clone(),
                            storage_path: location,
                            size_bytes: entry.size_bytes,
                            created_by: None,
                        });
                        report.files_created += 1;
                    }
                }
                // Loose files directly under the storage root have no
                // owning folder and stay catalog-less.
            }
        }

        if report.folders_created > 0 || report.files_created > 0 {
            info!(
                folders = report.folders_created,
                files = report.files_created,
                "Reconciled physical tree into catalog"
            );
        }
        Ok(report)
    }

    /// Ensures catalog folders exist for every segment between the
    /// storage root and `resolved`. Returns the folder for `resolved`
    /// itself, or `None` when `resolved` is the storage root.
    fn ensure_folder_chain(
        &self,
        resolved: &Path,
        report: &mut ReconcileReport,
    ) -> AppResult<Option<Folder>> {
        let relative = resolved
            .strip_prefix(self.vault.root())
            .map_err(|_| AppError::validation("Path escapes the storage root"))?;

        let mut current: Option<Folder> = None;
        for segment in relative.iter() {
            let name = segment.to_string_lossy().to_string();
            current = Some(match &current {
                Some(parent) => self.get_or_insert_child(parent, &name, report),
                None => self.get_or_insert_root(&name, report),
            });
        }
        Ok(current)
    }

    fn get_or_insert_root(&self, name: &str, report: &mut ReconcileReport) -> Folder {
        let (folder, created) = self.folders.get_or_insert(CreateFolder {
            parent_id: None,
            name: name.to_string(),
            path: format!("/{name}"),
            granted_user_ids: HashSet::new(),
            created_by: None,
        });
        if created {
            report.folders_created += 1;
        }
        folder
    }

    fn get_or_insert_child(&self, parent: &Folder, name: &str, report: &mut ReconcileReport) -> Folder {
        let (folder, created) = self.folders.get_or_insert(CreateFolder {
            parent_id: Some(parent.id),
            name: name.to_string(),
            path: format!("{}/{name}", parent.path),
            granted_user_ids: HashSet::new(),
            created_by: None,
        });
        if created {
            report.folders_created += 1;
        }
        folder
    }

    /// Recursive listing of a physical directory.
    fn list_recursive<'a>(
        &'a self,
        dir: &'a Path,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = AppResult<Vec<PhysicalItem>>> + Send + 'a>,
    > {
        Box::pin(async move {
            let mut items = Vec::new();
            for entry in self.vault.scan_dir(dir).await? {
                if entry.is_dir {
                    let children = self.list_recursive(&entry.path).await?;
                    let size_kb = children.iter().map(|c| c.size_kb).sum();
                    items.push(PhysicalItem {
                        name: entry.name,
                        is_dir: true,
                        size_kb,
                        child_count: Some(children.len()),
                        children,
                    });
                } else {
                    items.push(PhysicalItem {
                        name: entry.name,
                        is_dir: false,
                        size_kb: entry.size_bytes as f64 / 1024.0,
                        child_count: None,
                        children: Vec::new(),
                    });
                }
            }
            Ok(items)
        })
    }
}
