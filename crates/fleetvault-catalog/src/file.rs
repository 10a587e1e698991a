//! File entry store: records indexed by id and by owning folder.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use fleetvault_core::error::AppError;
use fleetvault_core::result::AppResult;
use fleetvault_core::types::pagination::{PageRequest, PageResponse, SortOrder};
use fleetvault_entity::file::{CreateFileEntry, FileEntry};

/// Store for file entry records.
#[derive(Debug, Default)]
pub struct FileCatalog {
    inner: RwLock<FileIndex>,
}

#[derive(Debug, Default)]
struct FileIndex {
    /// All file records by id.
    entries: HashMap<Uuid, FileEntry>,
    /// File ids per owning folder.
    by_folder: HashMap<Uuid, HashSet<Uuid>>,
}

impl FileCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new file entry.
    pub fn insert(&self, data: CreateFileEntry) -> FileEntry {
        let entry = FileEntry {
            id: Uuid::new_v4(),
            folder_id: data.folder_id,
            name: data.name,
            storage_path: data.storage_path,
            size_bytes: data.size_bytes,
            created_by: data.created_by,
            uploaded_at: Utc::now(),
        };

        let mut inner = crate::write_recover(&self.inner);
        inner
            .by_folder
            .entry(entry.folder_id)
            .or_default()
            .insert(entry.id);
        inner.entries.insert(entry.id, entry.clone());
        entry
    }

    /// Find a file entry by ID.
    pub fn find_by_id(&self, id: Uuid) -> Option<FileEntry> {
        crate::read_recover(&self.inner).entries.get(&id).cloned()
    }

    /// Find the entries for the given ids, skipping unknown ones.
    pub fn find_by_ids(&self, ids: &[Uuid]) -> Vec<FileEntry> {
        let inner = crate::read_recover(&self.inner);
        ids.iter()
            .filter_map(|id| inner.entries.get(id).cloned())
            .collect()
    }

    /// Find an entry by its physical storage location.
    pub fn find_by_storage_path(&self, storage_path: &str) -> Option<FileEntry> {
        let inner = crate::read_recover(&self.inner);
        inner
            .entries
            .values()
            .find(|e| e.storage_path == storage_path)
            .cloned()
    }

    /// List files in a folder, paged and sorted.
    pub fn find_by_folder(&self, folder_id: Uuid, page: &PageRequest) -> PageResponse<FileEntry> {
        let mut files = self.list_in_folder(folder_id);
        sort_entries(&mut files, page);
        PageResponse::paginate(files, page)
    }

    /// All files in a folder, unsorted.
    pub fn list_in_folder(&self, folder_id: Uuid) -> Vec<FileEntry> {
        let inner = crate::read_recover(&self.inner);
        inner
            .by_folder
            .get(&folder_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.entries.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace an entry with an updated record, re-indexing on folder change.
    pub fn update(&self, entry: FileEntry) -> AppResult<FileEntry> {
        let mut inner = crate::write_recover(&self.inner);
        let previous = inner
            .entries
            .get(&entry.id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("File {} not found", entry.id)))?;

        if previous.folder_id != entry.folder_id {
            if let Some(ids) = inner.by_folder.get_mut(&previous.folder_id) {
                ids.remove(&entry.id);
            }
            inner
                .by_folder
                .entry(entry.folder_id)
                .or_default()
                .insert(entry.id);
        }

        inner.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    /// Remove a single entry.
    pub fn remove(&self, id: Uuid) -> Option<FileEntry> {
        let mut inner = crate::write_recover(&self.inner);
        let entry = inner.entries.remove(&id)?;
        if let Some(ids) = inner.by_folder.get_mut(&entry.folder_id) {
            ids.remove(&id);
        }
        Some(entry)
    }

    /// Remove several entries, returning the records that existed.
    pub fn remove_many(&self, ids: &[Uuid]) -> Vec<FileEntry> {
        ids.iter().filter_map(|id| self.remove(*id)).collect()
    }

    /// Case-insensitive substring search over display names.
    pub fn search_by_name(&self, fragment: &str) -> Vec<FileEntry> {
        let needle = fragment.to_lowercase();
        let inner = crate::read_recover(&self.inner);
        inner
            .entries
            .values()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Rewrite the storage-path prefix of every entry under a moved or
    /// renamed directory. The physical files were already relocated in
    /// one directory move, so this is pure record bookkeeping.
    pub fn rewrite_storage_prefix(&self, old_prefix: &str, new_prefix: &str) {
        let old_dir = format!("{}/", old_prefix.trim_end_matches('/'));
        let mut inner = crate::write_recover(&self.inner);
        for entry in inner.entries.values_mut() {
            if let Some(rest) = entry.storage_path.strip_prefix(&old_dir) {
                entry.storage_path = format!("{}/{rest}", new_prefix.trim_end_matches('/'));
            }
        }
    }

    /// Sort a file list by the requested sort field and direction.
    pub fn sort(entries: &mut [FileEntry], page: &PageRequest) {
        sort_entries(entries, page);
    }

    /// Total number of file records.
    pub fn len(&self) -> usize {
        crate::read_recover(&self.inner).entries.len()
    }

    /// Whether the catalog holds no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sort_entries(entries: &mut [FileEntry], page: &PageRequest) {
    match page.sort.as_deref().unwrap_or("name") {
        "uploaded_at" => entries.sort_by_key(|e| e.uploaded_at),
        "size_bytes" => entries.sort_by_key(|e| e.size_bytes),
        _ => entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
    }
    if page.order == SortOrder::Desc {
        entries.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(folder_id: Uuid, name: &str, path: &str) -> CreateFileEntry {
        CreateFileEntry {
            folder_id,
            name: name.to_string(),
            storage_path: path.to_string(),
            size_bytes: 3,
            created_by: None,
        }
    }

    #[test]
    fn insert_and_list_by_folder() {
        let catalog = FileCatalog::new();
        let folder = Uuid::new_v4();
        catalog.insert(create(folder, "a.txt", "/vault/f/a.txt"));
        catalog.insert(create(folder, "b.txt", "/vault/f/b.txt"));
        catalog.insert(create(Uuid::new_v4(), "c.txt", "/vault/g/c.txt"));

        assert_eq!(catalog.list_in_folder(folder).len(), 2);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn update_reindexes_on_folder_change() {
        let catalog = FileCatalog::new();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let mut entry = catalog.insert(create(from, "a.txt", "/vault/f/a.txt"));

        entry.folder_id = to;
        catalog.update(entry).unwrap();

        assert!(catalog.list_in_folder(from).is_empty());
        assert_eq!(catalog.list_in_folder(to).len(), 1);
    }

    #[test]
    fn rewrite_storage_prefix_touches_only_subtree() {
        let catalog = FileCatalog::new();
        let folder = Uuid::new_v4();
        let inside = catalog.insert(create(folder, "a.txt", "/vault/Docs/2024/a.txt"));
        let outside = catalog.insert(create(folder, "b.txt", "/vault/Docs2/b.txt"));

        catalog.rewrite_storage_prefix("/vault/Docs", "/vault/Archive");

        assert_eq!(
            catalog.find_by_id(inside.id).unwrap().storage_path,
            "/vault/Archive/2024/a.txt"
        );
        assert_eq!(
            catalog.find_by_id(outside.id).unwrap().storage_path,
            "/vault/Docs2/b.txt"
        );
    }

    #[test]
    fn search_is_case_insensitive() {
        let catalog = FileCatalog::new();
        let folder = Uuid::new_v4();
        catalog.insert(create(folder, "Manual.PDF", "/vault/f/m.pdf"));
        assert_eq!(catalog.search_by_name("manual").len(), 1);
        assert!(catalog.search_by_name("missing").is_empty());
    }
}
