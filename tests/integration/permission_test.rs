//! Access control integration tests across the service surface.

use std::collections::HashSet;

use fleetvault_core::error::ErrorKind;
use fleetvault_core::types::pagination::PageRequest;
use fleetvault_service::folder::service::CreateFolderRequest;

use crate::integration::helpers::TestApp;

#[tokio::test]
async fn root_listing_is_scoped_to_accessible_roots() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    app.mkdir("Private", None).await;

    let user = app.user_with_roots(&[docs.id]);
    let page = app.folder_service.list_root_folders(&user, &PageRequest::default());
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].id, docs.id);

    let admin_page = app
        .folder_service
        .list_root_folders(&app.admin(), &PageRequest::default());
    assert_eq!(admin_page.total_items, 2);
}

#[tokio::test]
async fn root_grant_reaches_deep_descendants() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let year = app.mkdir("2024", Some(docs.id)).await;
    let entry = app.put_file(year.id, "report.pdf", "pdf").await;

    // A user holding only the root-level grant reads a file two levels
    // down via the ancestor walk.
    let user = app.user_with_roots(&[docs.id]);
    let fetched = app.file_service.get_file(&user, entry.id).unwrap();
    assert_eq!(fetched.id, entry.id);

    let detail = app.folder_service.get_folder(&user, year.id).unwrap();
    assert_eq!(detail.folder.id, year.id);
}

#[tokio::test]
async fn stranger_is_denied_reads_and_writes() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let entry = app.put_file(docs.id, "a.txt", "a").await;
    let stranger = app.stranger();

    let err = app.folder_service.get_folder(&stranger, docs.id).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let err = app
        .folder_service
        .rename_folder(&stranger, docs.id, "Hijacked")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let err = app.file_service.get_file(&stranger, entry.id).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let err = app
        .file_service
        .delete_file(&stranger, entry.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn explicit_grant_allows_subtree_without_root_grant() {
    let app = TestApp::new().await;
    let user = app.stranger();

    let docs = app.mkdir("Docs", None).await;
    let shared = app
        .folder_service
        .create_folder(
            &app.admin(),
            CreateFolderRequest {
                name: "shared".to_string(),
                parent_id: Some(docs.id),
                granted_user_ids: HashSet::from([user.user_id()]),
            },
        )
        .await
        .unwrap();
    let leaf = app.mkdir("leaf", Some(shared.id)).await;

    // Grant on the intermediate folder inherits downward...
    assert!(app.folder_service.get_folder(&user, leaf.id).is_ok());
    // ...but not upward to the root.
    assert_eq!(
        app.folder_service.get_folder(&user, docs.id).unwrap_err().kind,
        ErrorKind::Forbidden
    );
}

#[tokio::test]
async fn subfolder_creation_requires_write_on_parent() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let stranger = app.stranger();

    let err = app
        .folder_service
        .create_folder(
            &stranger,
            CreateFolderRequest {
                name: "intruder".to_string(),
                parent_id: Some(docs.id),
                granted_user_ids: HashSet::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn folder_search_respects_access() {
    let app = TestApp::new().await;
    let open = app.mkdir("Manuals-Open", None).await;
    app.mkdir("Manuals-Private", None).await;

    let user = app.user_with_roots(&[open.id]);
    let result = app
        .folder_service
        .search_folders(&user, "manuals", &PageRequest::default());
    assert_eq!(result.total_items, 1);
    assert_eq!(result.items[0].id, open.id);
}
