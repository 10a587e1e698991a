//! Local filesystem synchronizer for the document vault.
//!
//! Mirrors catalog operations onto real directories and files under a
//! configured root. Deletes are idempotent against already-absent
//! targets; directory moves refuse to clobber an existing destination.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use futures::stream::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use fleetvault_core::error::{AppError, ErrorKind};
use fleetvault_core::result::AppResult;

use crate::paths;

/// A stream of file content chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// One entry found while scanning a physical directory.
#[derive(Debug, Clone)]
pub struct ScanEntry {
    /// File or directory name.
    pub name: String,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Whether this entry is a directory.
    pub is_dir: bool,
    /// Size in bytes (0 for directories).
    pub size_bytes: u64,
}

/// Local filesystem vault rooted at the configured storage directory.
#[derive(Debug, Clone)]
pub struct LocalVault {
    /// Root directory for the whole physical tree.
    root: PathBuf,
}

impl LocalVault {
    /// Create a vault rooted at the given path, creating it if absent.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Physical directory backing a virtual folder path.
    pub fn dir_path(&self, virtual_path: &str) -> PathBuf {
        let clean = virtual_path.trim_start_matches('/');
        self.root.join(clean)
    }

    /// Resolve a user-supplied relative path inside the root, rejecting
    /// traversal attempts.
    pub fn resolve_user_path(&self, user_path: &str) -> AppResult<PathBuf> {
        paths::resolve_within(&self.root, user_path)
    }

    /// Create the physical directory for a virtual folder path.
    pub async fn create_dir(&self, virtual_path: &str) -> AppResult<()> {
        let dir = self.dir_path(virtual_path);
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory for '{virtual_path}'"),
                e,
            )
        })?;
        debug!(path = virtual_path, "Created directory");
        Ok(())
    }

    /// Move or rename a directory, carrying its whole subtree.
    ///
    /// Fails with `Conflict` when the destination already exists; a
    /// missing source is a no-op so that record-only repairs can re-run.
    pub async fn move_dir(&self, old_virtual: &str, new_virtual: &str) -> AppResult<()> {
        let from = self.dir_path(old_virtual);
        let to = self.dir_path(new_virtual);

        if !from.exists() {
            return Ok(());
        }
        if to.exists() {
            return Err(AppError::conflict(format!(
                "Destination '{new_virtual}' already exists"
            )));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to create parent directory", e)
            })?;
        }

        fs::rename(&from, &to).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to move directory '{old_virtual}' -> '{new_virtual}'"),
                e,
            )
        })?;
        debug!(from = old_virtual, to = new_virtual, "Moved directory");
        Ok(())
    }

    /// Delete a directory tree. Deleting a missing directory is not an error.
    pub async fn delete_dir(&self, virtual_path: &str) -> AppResult<()> {
        let dir = self.dir_path(virtual_path);
        if dir.exists() {
            fs::remove_dir_all(&dir).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete directory '{virtual_path}'"),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Write file bytes under a folder's physical directory, creating the
    /// directory if absent. Returns the absolute storage location.
    pub async fn write_file(
        &self,
        dir_virtual: &str,
        file_name: &str,
        data: &Bytes,
    ) -> AppResult<PathBuf> {
        let dir = self.dir_path(dir_virtual);
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to create folder directory", e)
        })?;

        let target = dir.join(file_name);
        fs::write(&target, data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write file '{file_name}'"),
                e,
            )
        })?;

        debug!(path = %target.display(), bytes = data.len(), "Wrote file");
        Ok(target)
    }

    /// Copy a physical file into a folder's directory under a new name.
    pub async fn copy_file_to(
        &self,
        from: &Path,
        dir_virtual: &str,
        file_name: &str,
    ) -> AppResult<PathBuf> {
        let dir = self.dir_path(dir_virtual);
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to create folder directory", e)
        })?;

        let target = dir.join(file_name);
        fs::copy(from, &target).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to copy {} -> {}", from.display(), target.display()),
                e,
            )
        })?;
        Ok(target)
    }

    /// Move a physical file into a folder's directory under a new name.
    ///
    /// Falls back to copy + delete when rename crosses a filesystem
    /// boundary.
    pub async fn move_file_to(
        &self,
        from: &Path,
        dir_virtual: &str,
        file_name: &str,
    ) -> AppResult<PathBuf> {
        let dir = self.dir_path(dir_virtual);
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to create folder directory", e)
        })?;

        let target = dir.join(file_name);
        match fs::rename(from, &target).await {
            Ok(()) => Ok(target),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                fs::copy(from, &target).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to copy across devices", e)
                })?;
                fs::remove_file(from).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to remove moved source", e)
                })?;
                Ok(target)
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to move {} -> {}", from.display(), target.display()),
                e,
            )),
        }
    }

    /// Delete a physical file. Deleting a missing file is not an error.
    pub async fn delete_file(&self, location: &Path) -> AppResult<()> {
        match fs::remove_file(location).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file '{}'", location.display()),
                e,
            )),
        }
    }

    /// Read a whole file into memory.
    pub async fn read_bytes(&self, location: &Path) -> AppResult<Bytes> {
        let data = fs::read(location).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found("File content not found on disk")
            } else {
                AppError::with_source(ErrorKind::Storage, "Failed to read file", e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    /// Open a file as a chunked stream.
    pub async fn read_stream(&self, location: &Path) -> AppResult<ByteStream> {
        let file = fs::File::open(location).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found("File content not found on disk")
            } else {
                AppError::with_source(ErrorKind::Storage, "Failed to open file", e)
            }
        })?;
        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(Bytes::from))))
    }

    /// Whether a physical path exists.
    pub async fn exists(&self, location: &Path) -> bool {
        fs::try_exists(location).await.unwrap_or(false)
    }

    /// List one level of a physical directory.
    pub async fn scan_dir(&self, dir: &Path) -> AppResult<Vec<ScanEntry>> {
        if !self.exists(dir).await {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to list directory '{}'", dir.display()),
                e,
            )
        })?;

        while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let meta = entry.metadata().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read entry metadata", e)
            })?;
            entries.push(ScanEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.path(),
                is_dir: meta.is_dir(),
                size_bytes: if meta.is_file() { meta.len() } else { 0 },
            });
        }

        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then(a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Generate a unique physical filename, preserving the display name
    /// as a sanitized suffix.
    pub fn unique_file_name(display_name: &str) -> String {
        format!(
            "{}_{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(display_name)
        )
    }
}

/// Replace characters that are unsafe in filenames with underscores.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Guess MIME type from a file name extension.
pub fn mime_from_path(path: &str) -> Option<String> {
    let ext = path.rsplit('.').next()?.to_lowercase();
    let mime = match ext.as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(mime.to_string())
}
