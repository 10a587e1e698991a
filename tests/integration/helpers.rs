//! Shared test helpers for integration tests.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use fleetvault_auth::access::AccessEvaluator;
use fleetvault_catalog::{FileCatalog, FolderCatalog};
use fleetvault_entity::folder::Folder;
use fleetvault_entity::identity::{Identity, Role};
use fleetvault_service::browse::BrowseService;
use fleetvault_service::context::RequestContext;
use fleetvault_service::file::service::{FileService, UploadedFile};
use fleetvault_service::folder::download::ArchiveService;
use fleetvault_service::folder::service::{CreateFolderRequest, FolderService};
use fleetvault_storage::local::LocalVault;

/// Full service stack over a temporary storage root.
pub struct TestApp {
    /// Keeps the temp dir alive for the test's duration.
    pub tmp: tempfile::TempDir,
    pub vault: Arc<LocalVault>,
    pub folders: Arc<FolderCatalog>,
    pub files: Arc<FileCatalog>,
    pub folder_service: Arc<FolderService>,
    pub file_service: Arc<FileService>,
    pub archive_service: Arc<ArchiveService>,
    pub browse_service: Arc<BrowseService>,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("temp dir");
        let vault = Arc::new(
            LocalVault::new(tmp.path().to_str().expect("utf-8 temp path"))
                .await
                .expect("vault"),
        );
        let folders = Arc::new(FolderCatalog::new());
        let files = Arc::new(FileCatalog::new());
        let access = Arc::new(AccessEvaluator::new(folders.clone()));

        let file_service = Arc::new(FileService::new(
            files.clone(),
            folders.clone(),
            access.clone(),
            vault.clone(),
        ));
        let folder_service = Arc::new(FolderService::new(
            folders.clone(),
            files.clone(),
            access.clone(),
            vault.clone(),
            file_service.clone(),
        ));
        let archive_service = Arc::new(ArchiveService::new(
            folders.clone(),
            files.clone(),
            access.clone(),
        ));
        let browse_service = Arc::new(BrowseService::new(
            folders.clone(),
            files.clone(),
            vault.clone(),
        ));

        Self {
            tmp,
            vault,
            folders,
            files,
            folder_service,
            file_service,
            archive_service,
            browse_service,
        }
    }

    /// An administrator context.
    pub fn admin(&self) -> RequestContext {
        RequestContext::new(Identity::admin(Uuid::new_v4()))
    }

    /// A basic user granted direct access to the given root folders.
    pub fn user_with_roots(&self, roots: &[Uuid]) -> RequestContext {
        RequestContext::new(Identity::new(
            Uuid::new_v4(),
            HashSet::from([Role::Basic]),
            roots.iter().copied().collect(),
        ))
    }

    /// A basic user with no grants at all.
    pub fn stranger(&self) -> RequestContext {
        self.user_with_roots(&[])
    }

    /// Create a folder as admin, panicking on failure.
    pub async fn mkdir(&self, name: &str, parent_id: Option<Uuid>) -> Folder {
        self.folder_service
            .create_folder(
                &self.admin(),
                CreateFolderRequest {
                    name: name.to_string(),
                    parent_id,
                    granted_user_ids: HashSet::new(),
                },
            )
            .await
            .expect("create folder")
    }

    /// Upload a small file as admin.
    pub async fn put_file(
        &self,
        folder_id: Uuid,
        name: &str,
        content: &str,
    ) -> fleetvault_entity::file::FileEntry {
        self.file_service
            .upload(
                &self.admin(),
                folder_id,
                UploadedFile {
                    name: name.to_string(),
                    bytes: Bytes::from(content.to_string()),
                },
            )
            .await
            .expect("upload file")
    }
}
