//! # fleetvault-storage
//!
//! Physical side of the vault: traversal-safe path resolution, the local
//! filesystem synchronizer mirroring the virtual folder tree, and the zip
//! archive builder for whole-folder downloads.

pub mod archive;
pub mod local;
pub mod paths;

pub use archive::{ZipBuilder, ZipHandle};
pub use local::{ByteStream, LocalVault, ScanEntry, mime_from_path, sanitize_file_name};
pub use paths::resolve_within;
