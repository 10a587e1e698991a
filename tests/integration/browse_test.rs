//! Physical-view and reconciliation integration tests.

use fleetvault_core::error::ErrorKind;

use crate::integration::helpers::TestApp;

/// Seed files straight onto disk, bypassing the services.
fn seed_disk(app: &TestApp) {
    let root = app.vault.root();
    std::fs::create_dir_all(root.join("Fleet/2024")).unwrap();
    std::fs::write(root.join("Fleet/readme.txt"), b"hello").unwrap();
    std::fs::write(root.join("Fleet/2024/audit.pdf"), b"audit report").unwrap();
}

#[tokio::test]
async fn browse_reconciles_disk_into_catalog() {
    let app = TestApp::new().await;
    seed_disk(&app);

    let items = app.browse_service.browse("").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Fleet");
    assert!(items[0].is_dir);
    assert_eq!(items[0].child_count, Some(2));

    // The scan created matching catalog records.
    let fleet = app.folders.find_by_parent_and_name(None, "Fleet").unwrap();
    assert_eq!(fleet.path, "/Fleet");
    let year = app
        .folders
        .find_by_parent_and_name(Some(fleet.id), "2024")
        .unwrap();
    assert_eq!(app.files.list_in_folder(fleet.id).len(), 1);
    assert_eq!(app.files.list_in_folder(year.id).len(), 1);
}

#[tokio::test]
async fn reconcile_is_idempotent_and_one_way() {
    let app = TestApp::new().await;
    seed_disk(&app);

    let first = app.browse_service.reconcile_from_disk("").await.unwrap();
    assert_eq!(first.folders_created, 2);
    assert_eq!(first.files_created, 2);

    let second = app.browse_service.reconcile_from_disk("").await.unwrap();
    assert_eq!(second.folders_created, 0);
    assert_eq!(second.files_created, 0);

    // Removing a file from disk never deletes its record here.
    std::fs::remove_file(app.vault.root().join("Fleet/readme.txt")).unwrap();
    app.browse_service.reconcile_from_disk("").await.unwrap();
    let fleet = app.folders.find_by_parent_and_name(None, "Fleet").unwrap();
    assert_eq!(app.files.list_in_folder(fleet.id).len(), 1);
}

#[tokio::test]
async fn traversal_attempts_are_rejected() {
    let app = TestApp::new().await;

    let err = app.browse_service.browse("../outside").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .browse_service
        .resolve_download("a/../../etc/passwd")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn missing_directory_lists_empty() {
    let app = TestApp::new().await;
    let items = app.browse_service.browse("nowhere/yet").await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn path_addressed_download_and_view() {
    let app = TestApp::new().await;
    seed_disk(&app);

    let (location, name) = app
        .browse_service
        .resolve_download("Fleet/2024/audit.pdf")
        .await
        .unwrap();
    assert_eq!(name, "audit.pdf");
    assert!(location.is_file());

    let (_, mime) = app
        .browse_service
        .resolve_view("Fleet/2024/audit.pdf")
        .await
        .unwrap();
    assert_eq!(mime, "application/pdf");

    let err = app
        .browse_service
        .resolve_download("Fleet/ghost.bin")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
