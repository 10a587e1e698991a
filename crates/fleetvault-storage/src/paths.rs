//! Traversal-safe resolution of user-supplied paths.

use std::path::{Component, Path, PathBuf};

use fleetvault_core::error::AppError;
use fleetvault_core::result::AppResult;

/// Resolve a user-supplied relative path against a root directory.
///
/// Separators are normalized (`\` → `/`), leading separators stripped,
/// and `.`/`..` segments collapsed lexically. Any path that would escape
/// `root` is rejected with a validation error. Purely lexical — nothing
/// is touched on disk, so the result may name a file that does not exist
/// yet.
pub fn resolve_within(root: &Path, user_path: &str) -> AppResult<PathBuf> {
    let normalized = user_path.replace('\\', "/");
    let trimmed = normalized.trim_start_matches('/');

    let mut segments: Vec<&str> = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment
                    .to_str()
                    .ok_or_else(|| AppError::validation("Path contains invalid characters"))?;
                segments.push(segment);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(traversal_error(user_path));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(traversal_error(user_path));
            }
        }
    }

    let mut resolved = root.to_path_buf();
    for segment in segments {
        resolved.push(segment);
    }

    if !resolved.starts_with(root) {
        return Err(traversal_error(user_path));
    }

    Ok(resolved)
}

fn traversal_error(user_path: &str) -> AppError {
    AppError::validation(format!("Path '{user_path}' escapes the storage root"))
}
