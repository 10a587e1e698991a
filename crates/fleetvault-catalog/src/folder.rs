//! Folder tree store: arena of nodes plus child and name indexes.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use fleetvault_core::error::AppError;
use fleetvault_core::result::AppResult;
use fleetvault_core::types::pagination::{PageRequest, PageResponse, SortOrder};
use fleetvault_entity::folder::{CreateFolder, Folder};

/// Store for folder records and the tree structure between them.
#[derive(Debug, Default)]
pub struct FolderCatalog {
    inner: RwLock<FolderIndex>,
}

#[derive(Debug, Default)]
struct FolderIndex {
    /// All folder records by id.
    nodes: HashMap<Uuid, Folder>,
    /// Child ids per parent id; root folders live under the `None` key.
    children: HashMap<Option<Uuid>, HashSet<Uuid>>,
    /// Uniqueness index over `(parent_id, lowercased name)`.
    by_name: HashMap<(Option<Uuid>, String), Uuid>,
}

fn name_key(parent_id: Option<Uuid>, name: &str) -> (Option<Uuid>, String) {
    (parent_id, name.to_lowercase())
}

impl FolderCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new folder, failing with `Conflict` when a sibling with
    /// the same name already exists under the same parent.
    pub fn insert(&self, data: CreateFolder) -> AppResult<Folder> {
        let mut inner = crate::write_recover(&self.inner);
        let key = name_key(data.parent_id, &data.name);
        if inner.by_name.contains_key(&key) {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists at this location",
                data.name
            )));
        }

        let folder = Folder {
            id: Uuid::new_v4(),
            parent_id: data.parent_id,
            name: data.name,
            path: data.path,
            granted_user_ids: data.granted_user_ids,
            created_by: data.created_by,
            created_at: Utc::now(),
        };

        inner.by_name.insert(key, folder.id);
        inner
            .children
            .entry(folder.parent_id)
            .or_default()
            .insert(folder.id);
        inner.nodes.insert(folder.id, folder.clone());
        Ok(folder)
    }

    /// Insert a folder, or return the existing sibling of the same name.
    ///
    /// The check and the insert happen under one write-lock acquisition,
    /// so two racing callers converge on a single record — the store
    /// equivalent of recovering from a unique-constraint violation by
    /// re-fetching. Returns `true` when this call created the record.
    pub fn get_or_insert(&self, data: CreateFolder) -> (Folder, bool) {
        let mut inner = crate::write_recover(&self.inner);
        let key = name_key(data.parent_id, &data.name);
        if let Some(existing_id) = inner.by_name.get(&key) {
            if let Some(existing) = inner.nodes.get(existing_id) {
                return (existing.clone(), false);
            }
        }

        let folder = Folder {
            id: Uuid::new_v4(),
            parent_id: data.parent_id,
            name: data.name,
            path: data.path,
            granted_user_ids: data.granted_user_ids,
            created_by: data.created_by,
            created_at: Utc::now(),
        };

        inner.by_name.insert(key, folder.id);
        inner
            .children
            .entry(folder.parent_id)
            .or_default()
            .insert(folder.id);
        inner.nodes.insert(folder.id, folder.clone());
        (folder, true)
    }

    /// Find a folder by ID.
    pub fn find_by_id(&self, id: Uuid) -> Option<Folder> {
        crate::read_recover(&self.inner).nodes.get(&id).cloned()
    }

    /// Find a folder by parent and name (case-insensitive).
    pub fn find_by_parent_and_name(&self, parent_id: Option<Uuid>, name: &str) -> Option<Folder> {
        let inner = crate::read_recover(&self.inner);
        let id = inner.by_name.get(&name_key(parent_id, name))?;
        inner.nodes.get(id).cloned()
    }

    /// List root folders, optionally restricted to an accessible-id set.
    pub fn find_roots(
        &self,
        filter_ids: Option<&HashSet<Uuid>>,
        page: &PageRequest,
    ) -> PageResponse<Folder> {
        let inner = crate::read_recover(&self.inner);
        let mut roots: Vec<Folder> = inner
            .children
            .get(&None)
            .map(|ids| {
                ids.iter()
                    .filter(|id| filter_ids.is_none_or(|f| f.contains(*id)))
                    .filter_map(|id| inner.nodes.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        drop(inner);

        sort_folders(&mut roots, page);
        PageResponse::paginate(roots, page)
    }

    /// List direct children of a folder, paged and sorted.
    pub fn find_children(&self, parent_id: Uuid, page: &PageRequest) -> PageResponse<Folder> {
        let mut children = self.children_of(parent_id);
        sort_folders(&mut children, page);
        PageResponse::paginate(children, page)
    }

    /// All direct children of a folder, unsorted.
    pub fn children_of(&self, parent_id: Uuid) -> Vec<Folder> {
        let inner = crate::read_recover(&self.inner);
        inner
            .children
            .get(&Some(parent_id))
            .map(|ids| ids.iter().filter_map(|id| inner.nodes.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    /// All descendants of a folder (excluding the folder itself),
    /// shallowest first.
    pub fn find_descendants(&self, id: Uuid) -> Vec<Folder> {
        let inner = crate::read_recover(&self.inner);
        let mut result = Vec::new();
        let mut queue: Vec<Uuid> = inner
            .children
            .get(&Some(id))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        while let Some(current) = queue.pop() {
            if let Some(folder) = inner.nodes.get(&current) {
                result.push(folder.clone());
            }
            if let Some(grandchildren) = inner.children.get(&Some(current)) {
                queue.extend(grandchildren.iter().copied());
            }
        }

        result.sort_by_key(|f| f.path.matches('/').count());
        result
    }

    /// The ancestor chain of a folder, starting with the folder itself
    /// and walking up to its root.
    pub fn ancestor_ids(&self, id: Uuid) -> Vec<Uuid> {
        let inner = crate::read_recover(&self.inner);
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(current_id) = current {
            let Some(folder) = inner.nodes.get(&current_id) else {
                break;
            };
            chain.push(current_id);
            current = folder.parent_id;
        }
        chain
    }

    /// Whether `candidate` is `ancestor` itself or lies anywhere in its
    /// subtree.
    pub fn is_self_or_descendant(&self, candidate: Uuid, ancestor: Uuid) -> bool {
        self.ancestor_ids(candidate).contains(&ancestor)
    }

    /// Rename a folder and rewrite the virtual paths of its whole subtree.
    pub fn rename(&self, id: Uuid, new_name: &str, new_path: &str) -> AppResult<Folder> {
        let mut inner = crate::write_recover(&self.inner);
        let folder = inner
            .nodes
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;

        let new_key = name_key(folder.parent_id, new_name);
        if inner.by_name.get(&new_key).is_some_and(|other| *other != id) {
            return Err(AppError::conflict(format!(
                "A folder named '{new_name}' already exists at this location"
            )));
        }

        let old_path = folder.path.clone();
        inner.by_name.remove(&name_key(folder.parent_id, &folder.name));
        inner.by_name.insert(new_key, id);

        let mut node = folder;
        node.name = new_name.to_string();
        node.path = new_path.to_string();
        inner.nodes.insert(id, node.clone());

        rewrite_descendant_paths(&mut inner, &old_path, new_path);
        Ok(node)
    }

    /// Move a folder under a new parent and rewrite subtree paths.
    ///
    /// Callers are responsible for cycle checks; the catalog only rejects
    /// sibling-name conflicts at the destination.
    pub fn reparent(&self, id: Uuid, new_parent_id: Uuid, new_path: &str) -> AppResult<Folder> {
        let mut inner = crate::write_recover(&self.inner);
        let folder = inner
            .nodes
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;

        let new_key = name_key(Some(new_parent_id), &folder.name);
        if inner.by_name.get(&new_key).is_some_and(|other| *other != id) {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists in the destination",
                folder.name
            )));
        }

        let old_path = folder.path.clone();
        inner.by_name.remove(&name_key(folder.parent_id, &folder.name));
        inner.by_name.insert(new_key, id);
        if let Some(siblings) = inner.children.get_mut(&folder.parent_id) {
            siblings.remove(&id);
        }
        inner.children.entry(Some(new_parent_id)).or_default().insert(id);

        let mut node = folder;
        node.parent_id = Some(new_parent_id);
        node.path = new_path.to_string();
        inner.nodes.insert(id, node.clone());

        rewrite_descendant_paths(&mut inner, &old_path, new_path);
        Ok(node)
    }

    /// Remove a single folder record from every index.
    ///
    /// Cascade ordering (children before parents) is the caller's job.
    pub fn remove(&self, id: Uuid) -> Option<Folder> {
        let mut inner = crate::write_recover(&self.inner);
        let folder = inner.nodes.remove(&id)?;
        inner.by_name.remove(&name_key(folder.parent_id, &folder.name));
        if let Some(siblings) = inner.children.get_mut(&folder.parent_id) {
            siblings.remove(&id);
        }
        inner.children.remove(&Some(id));
        Some(folder)
    }

    /// Case-insensitive substring search over folder names.
    ///
    /// Returns the full match set; callers filter for access before
    /// sorting and paginating.
    pub fn search_by_name(&self, fragment: &str) -> Vec<Folder> {
        let needle = fragment.to_lowercase();
        let inner = crate::read_recover(&self.inner);
        inner
            .nodes
            .values()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Sort a folder list by the requested sort field and direction.
    pub fn sort(folders: &mut [Folder], page: &PageRequest) {
        sort_folders(folders, page);
    }

    /// Total number of folder records.
    pub fn len(&self) -> usize {
        crate::read_recover(&self.inner).nodes.len()
    }

    /// Whether the catalog holds no folders.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rewrite the `path` of every node under `old_path` to start with
/// `new_path` instead. Mirrors a SQL `UPDATE ... WHERE path LIKE old/%`.
fn rewrite_descendant_paths(inner: &mut FolderIndex, old_path: &str, new_path: &str) {
    let old_prefix = format!("{old_path}/");
    for node in inner.nodes.values_mut() {
        if let Some(rest) = node.path.strip_prefix(&old_prefix) {
            node.path = format!("{new_path}/{rest}");
        }
    }
}

fn sort_folders(folders: &mut [Folder], page: &PageRequest) {
    match page.sort.as_deref().unwrap_or("name") {
        "created_at" => folders.sort_by_key(|f| f.created_at),
        "path" => folders.sort_by(|a, b| a.path.cmp(&b.path)),
        _ => folders.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
    }
    if page.order == SortOrder::Desc {
        folders.reverse();
    }
}
