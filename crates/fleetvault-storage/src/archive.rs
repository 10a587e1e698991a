//! Zip archive building for whole-folder downloads.
//!
//! The archive is written into a named temporary file; [`ZipHandle`]
//! unlinks it on drop, so cleanup happens on every exit path including
//! errors mid-stream.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;
use zip::write::{SimpleFileOptions, ZipWriter};

use fleetvault_core::error::{AppError, ErrorKind};
use fleetvault_core::result::AppResult;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Handle to a finished zip archive on disk.
///
/// The underlying temporary file is removed when the handle is dropped.
#[derive(Debug)]
pub struct ZipHandle {
    temp: NamedTempFile,
    file_name: String,
}

impl ZipHandle {
    /// Path of the temporary archive file.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Suggested download filename (`<folder>.zip`).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Open an independent read handle on the archive.
    ///
    /// The returned descriptor stays readable after the handle is
    /// dropped, so callers can drop the handle once streaming starts and
    /// the unlinked file is reclaimed when the stream finishes.
    pub fn reopen(&self) -> AppResult<File> {
        self.temp.reopen().map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to reopen archive file", e)
        })
    }
}

/// Incrementally writes folder subtrees into a zip container.
pub struct ZipBuilder {
    writer: ZipWriter<NamedTempFile>,
    file_name: String,
}

impl ZipBuilder {
    /// Start a new archive named after the folder being downloaded.
    pub fn new(folder_name: &str) -> AppResult<Self> {
        let temp = NamedTempFile::new().map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to create archive temp file", e)
        })?;
        Ok(Self {
            writer: ZipWriter::new(temp),
            file_name: format!("{}.zip", crate::local::sanitize_file_name(folder_name)),
        })
    }

    /// Add a directory entry so empty folders survive the round trip.
    ///
    /// `entry_path` is the in-archive path without a trailing slash.
    pub fn add_directory(&mut self, entry_path: &str) -> AppResult<()> {
        self.writer
            .add_directory(entry_path, SimpleFileOptions::default())
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to add archive directory '{entry_path}'"),
                    e,
                )
            })
    }

    /// Add a file entry from its physical location.
    ///
    /// A missing physical file is skipped (and logged) instead of
    /// failing the whole archive; returns whether the entry was written.
    pub fn add_file(&mut self, entry_path: &str, location: &Path) -> AppResult<bool> {
        let mut source = match File::open(location) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    entry = entry_path,
                    location = %location.display(),
                    "Skipping archive entry, physical file missing"
                );
                return Ok(false);
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open '{}' for archiving", location.display()),
                    e,
                ));
            }
        };

        self.writer
            .start_file(entry_path, SimpleFileOptions::default())
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to start archive entry '{entry_path}'"),
                    e,
                )
            })?;

        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        loop {
            let n = source.read(&mut buffer).map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read file for archiving", e)
            })?;
            if n == 0 {
                break;
            }
            self.writer.write_all(&buffer[..n]).map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to write archive entry", e)
            })?;
        }

        Ok(true)
    }

    /// Finish the archive and hand back the temp-file handle.
    pub fn finish(self) -> AppResult<ZipHandle> {
        let temp = self.writer.finish().map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to finalize archive", e)
        })?;
        Ok(ZipHandle {
            temp,
            file_name: self.file_name,
        })
    }
}
