//! Folder hierarchy integration tests: create, rename, move, delete,
//! tree upload, and substitution.

use std::collections::HashSet;
use std::path::Path;

use bytes::Bytes;
use fleetvault_core::error::ErrorKind;
use fleetvault_service::folder::service::{CreateFolderRequest, TreeUploadFile};

use crate::integration::helpers::TestApp;

#[tokio::test]
async fn create_folder_builds_physical_directory() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let year = app.mkdir("2024", Some(docs.id)).await;

    assert_eq!(year.path, "/Docs/2024");
    assert!(app.vault.dir_path("/Docs/2024").is_dir());
}

#[tokio::test]
async fn duplicate_folder_name_is_a_conflict() {
    let app = TestApp::new().await;
    app.mkdir("Docs", None).await;

    let err = app
        .folder_service
        .create_folder(
            &app.admin(),
            CreateFolderRequest {
                name: "docs".to_string(),
                parent_id: None,
                granted_user_ids: HashSet::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn rename_rewrites_descendants_and_moves_disk_tree() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let year = app.mkdir("2024", Some(docs.id)).await;
    let entry = app.put_file(year.id, "report.pdf", "pdf bytes").await;

    app.folder_service
        .rename_folder(&app.admin(), year.id, "2025")
        .await
        .unwrap();

    let year = app.folders.find_by_id(year.id).unwrap();
    assert_eq!(year.path, "/Docs/2025");

    // No descendant retains the old prefix, and the physical file is
    // reachable at its rewritten location.
    let entry = app.files.find_by_id(entry.id).unwrap();
    assert!(entry.storage_path.contains("/Docs/2025/"));
    assert!(!entry.storage_path.contains("/Docs/2024/"));
    assert!(Path::new(&entry.storage_path).is_file());
    assert!(!app.vault.dir_path("/Docs/2024").exists());
}

#[tokio::test]
async fn rename_to_same_name_is_a_noop() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let same = app
        .folder_service
        .rename_folder(&app.admin(), docs.id, "Docs")
        .await
        .unwrap();
    assert_eq!(same.path, "/Docs");
}

#[tokio::test]
async fn move_into_self_or_descendant_is_rejected() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let year = app.mkdir("2025", Some(docs.id)).await;

    let err = app
        .folder_service
        .move_folder(&app.admin(), docs.id, docs.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .folder_service
        .move_folder(&app.admin(), docs.id, year.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // Tree unchanged.
    let docs = app.folders.find_by_id(docs.id).unwrap();
    assert!(docs.parent_id.is_none());
    assert_eq!(docs.path, "/Docs");
}

#[tokio::test]
async fn move_folder_relocates_subtree() {
    let app = TestApp::new().await;
    let a = app.mkdir("A", None).await;
    let b = app.mkdir("B", None).await;
    let sub = app.mkdir("sub", Some(a.id)).await;
    let entry = app.put_file(sub.id, "f.txt", "x").await;

    app.folder_service
        .move_folder(&app.admin(), a.id, b.id)
        .await
        .unwrap();

    let a = app.folders.find_by_id(a.id).unwrap();
    let sub = app.folders.find_by_id(sub.id).unwrap();
    assert_eq!(a.path, "/B/A");
    assert_eq!(sub.path, "/B/A/sub");
    assert!(app.vault.dir_path("/B/A/sub").is_dir());

    let entry = app.files.find_by_id(entry.id).unwrap();
    assert!(Path::new(&entry.storage_path).is_file());
}

#[tokio::test]
async fn move_folder_destination_collision_fails() {
    let app = TestApp::new().await;
    let a = app.mkdir("A", None).await;
    let b = app.mkdir("B", None).await;
    app.mkdir("A", Some(b.id)).await;

    let err = app
        .folder_service
        .move_folder(&app.admin(), a.id, b.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn cascade_delete_leaves_no_records_or_files() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let year = app.mkdir("2024", Some(docs.id)).await;
    let deep = app.mkdir("reports", Some(year.id)).await;
    app.put_file(docs.id, "a.txt", "a").await;
    app.put_file(deep.id, "b.txt", "b").await;

    let report = app
        .folder_service
        .delete_folder(&app.admin(), docs.id)
        .await
        .unwrap();

    assert_eq!(report.deleted_folders, 3);
    assert_eq!(report.deleted_files, 2);
    assert!(report.orphaned_paths.is_empty());

    assert!(app.folders.is_empty());
    assert!(app.files.is_empty());
    assert!(!app.vault.dir_path("/Docs").exists());
}

#[tokio::test]
async fn tree_upload_creates_nested_folders_idempotently() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let uploads = vec![
        TreeUploadFile {
            relative_path: "manuals/2024/spec.pdf".to_string(),
            bytes: Bytes::from("spec"),
        },
        TreeUploadFile {
            relative_path: "manuals/2024/extra.pdf".to_string(),
            bytes: Bytes::from("extra"),
        },
        TreeUploadFile {
            relative_path: "top.txt".to_string(),
            bytes: Bytes::from("top"),
        },
    ];

    let report = app
        .folder_service
        .upload_tree(&app.admin(), docs.id, uploads)
        .await
        .unwrap();

    assert_eq!(report.saved.len(), 3);
    assert_eq!(report.created_folders, 2);
    assert!(report.failures.is_empty());

    let manuals = app
        .folders
        .find_by_parent_and_name(Some(docs.id), "manuals")
        .unwrap();
    let year = app
        .folders
        .find_by_parent_and_name(Some(manuals.id), "2024")
        .unwrap();
    assert_eq!(app.files.list_in_folder(year.id).len(), 2);
    assert_eq!(app.files.list_in_folder(docs.id).len(), 1);
}

#[tokio::test]
async fn concurrent_tree_uploads_converge_on_one_folder() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let upload = |name: &str| {
        vec![TreeUploadFile {
            relative_path: format!("shared/{name}"),
            bytes: Bytes::from("x"),
        }]
    };

    let admin = app.admin();
    let (a, b) = tokio::join!(
        app.folder_service.upload_tree(&admin, docs.id, upload("a.txt")),
        app.folder_service.upload_tree(&admin, docs.id, upload("b.txt")),
    );
    a.unwrap();
    b.unwrap();

    // Exactly one "shared" folder exists, holding both files.
    let children = app.folders.children_of(docs.id);
    assert_eq!(children.len(), 1);
    assert_eq!(app.files.list_in_folder(children[0].id).len(), 2);
}

#[tokio::test]
async fn substitute_replaces_folder_content() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let old_sub = app.mkdir("old", Some(docs.id)).await;
    let old_file = app.put_file(old_sub.id, "stale.txt", "stale").await;

    let report = app
        .folder_service
        .substitute_folder(
            &app.admin(),
            docs.id,
            vec![TreeUploadFile {
                relative_path: "fresh/new.txt".to_string(),
                bytes: Bytes::from("new"),
            }],
        )
        .await
        .unwrap();

    assert_eq!(report.saved.len(), 1);
    assert!(app.folders.find_by_id(old_sub.id).is_none());
    assert!(app.files.find_by_id(old_file.id).is_none());
    assert!(!Path::new(&old_file.storage_path).exists());

    let fresh = app
        .folders
        .find_by_parent_and_name(Some(docs.id), "fresh")
        .unwrap();
    assert_eq!(app.files.list_in_folder(fresh.id).len(), 1);
}
