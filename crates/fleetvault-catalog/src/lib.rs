//! # fleetvault-catalog
//!
//! The authoritative stores for the virtual folder hierarchy and its file
//! entries. Nodes live in an arena keyed by id with an explicit parent
//! back-reference and a separately maintained child index, so moves and
//! cycle checks are plain walks over ids — no owning pointers in either
//! direction.
//!
//! Each operation takes the store's write lock once, which makes the
//! record-level changes of one operation atomic with respect to others.
//! Physical filesystem synchronization is layered on top by the service
//! crate and is deliberately not covered by that atomicity.

pub mod file;
pub mod folder;

pub use file::FileCatalog;
pub use folder::FolderCatalog;

use std::sync::{RwLockReadGuard, RwLockWriteGuard};

// Poison recovery: a panicked writer must not take every later request
// down with it.
pub(crate) fn read_recover<T>(lock: &std::sync::RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

pub(crate) fn write_recover<T>(lock: &std::sync::RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
