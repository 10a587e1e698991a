//! State construction and wiring.

use std::sync::Arc;

use fleetvault_auth::access::AccessEvaluator;
use fleetvault_catalog::{FileCatalog, FolderCatalog};
use fleetvault_core::config::AppConfig;
use fleetvault_core::result::AppResult;
use fleetvault_service::browse::BrowseService;
use fleetvault_service::file::service::FileService;
use fleetvault_service::folder::download::ArchiveService;
use fleetvault_service::folder::service::FolderService;
use fleetvault_storage::local::LocalVault;

use crate::state::AppState;

/// Builds the full application state from configuration: stores, vault,
/// evaluator, and the services layered over them.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
    let vault = Arc::new(LocalVault::new(&config.storage.root_path).await?);
    tracing::info!(root = %vault.root().display(), "Vault storage initialized");

    let folder_catalog = Arc::new(FolderCatalog::new());
    let file_catalog = Arc::new(FileCatalog::new());
    let access = Arc::new(AccessEvaluator::new(folder_catalog.clone()));

    let file_service = Arc::new(FileService::new(
        file_catalog.clone(),
        folder_catalog.clone(),
        access.clone(),
        vault.clone(),
    ));
    let folder_service = Arc::new(FolderService::new(
        folder_catalog.clone(),
        file_catalog.clone(),
        access.clone(),
        vault.clone(),
        file_service.clone(),
    ));
    let archive_service = Arc::new(ArchiveService::new(
        folder_catalog.clone(),
        file_catalog.clone(),
        access.clone(),
    ));
    let browse_service = Arc::new(BrowseService::new(
        folder_catalog.clone(),
        file_catalog.clone(),
        vault.clone(),
    ));

    Ok(AppState {
        config: Arc::new(config),
        folder_catalog,
        file_catalog,
        vault,
        access,
        folder_service,
        file_service,
        archive_service,
        browse_service,
    })
}
