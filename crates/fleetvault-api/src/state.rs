//! Application state shared across all handlers.

use std::sync::Arc;

use fleetvault_auth::access::AccessEvaluator;
use fleetvault_catalog::{FileCatalog, FolderCatalog};
use fleetvault_core::config::AppConfig;
use fleetvault_service::browse::BrowseService;
use fleetvault_service::file::service::FileService;
use fleetvault_service::folder::download::ArchiveService;
use fleetvault_service::folder::service::FolderService;
use fleetvault_storage::local::LocalVault;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,

    /// Folder store.
    pub folder_catalog: Arc<FolderCatalog>,
    /// File store.
    pub file_catalog: Arc<FileCatalog>,
    /// Physical vault.
    pub vault: Arc<LocalVault>,
    /// Access evaluator.
    pub access: Arc<AccessEvaluator>,

    /// Folder service.
    pub folder_service: Arc<FolderService>,
    /// File service.
    pub file_service: Arc<FileService>,
    /// Archive (zip download) service.
    pub archive_service: Arc<ArchiveService>,
    /// Physical browse service.
    pub browse_service: Arc<BrowseService>,
}
