//! File entry integration tests: upload, rename, replace, move, copy,
//! delete, search.

use std::path::Path;

use bytes::Bytes;
use fleetvault_core::error::ErrorKind;
use fleetvault_core::types::pagination::PageRequest;
use fleetvault_service::file::service::UploadedFile;
use futures::StreamExt;

use crate::integration::helpers::TestApp;

async fn read_all(mut stream: fleetvault_storage::local::ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}

#[tokio::test]
async fn upload_preserves_display_name_and_uniquifies_storage() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let entry = app.put_file(docs.id, "report.pdf", "pdf bytes").await;
    assert_eq!(entry.name, "report.pdf");
    assert_eq!(entry.size_bytes, 9);

    let physical = Path::new(&entry.storage_path);
    assert!(physical.is_file());
    let file_name = physical.file_name().unwrap().to_string_lossy();
    assert!(file_name.ends_with("_report.pdf"));
    assert_ne!(file_name, "report.pdf");
}

#[tokio::test]
async fn same_display_name_twice_keeps_both_files() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let first = app.put_file(docs.id, "report.pdf", "v1").await;
    let second = app.put_file(docs.id, "report.pdf", "v2").await;

    assert_ne!(first.storage_path, second.storage_path);
    assert!(Path::new(&first.storage_path).is_file());
    assert!(Path::new(&second.storage_path).is_file());
}

#[tokio::test]
async fn download_roundtrips_content() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let entry = app.put_file(docs.id, "a.txt", "hello roundtrip").await;

    let (fetched, stream) = app
        .file_service
        .download(&app.admin(), entry.id)
        .await
        .unwrap();
    assert_eq!(fetched.id, entry.id);
    assert_eq!(read_all(stream).await, b"hello roundtrip");
}

#[tokio::test]
async fn view_sniffs_mime_from_display_name() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let entry = app.put_file(docs.id, "report.pdf", "pdf").await;

    let (_, _, mime) = app.file_service.view(&app.admin(), entry.id).await.unwrap();
    assert_eq!(mime, "application/pdf");
}

#[tokio::test]
async fn upload_many_skips_empty_payloads() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let outcome = app
        .file_service
        .upload_many(
            &app.admin(),
            docs.id,
            vec![
                UploadedFile {
                    name: "a.txt".to_string(),
                    bytes: Bytes::from("a"),
                },
                UploadedFile {
                    name: "empty.txt".to_string(),
                    bytes: Bytes::new(),
                },
                UploadedFile {
                    name: "b.txt".to_string(),
                    bytes: Bytes::from("b"),
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(outcome.saved.len(), 2);
    assert!(outcome.failures.is_empty());
    assert_eq!(app.files.list_in_folder(docs.id).len(), 2);
}

#[tokio::test]
async fn rename_touches_metadata_only() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let entry = app.put_file(docs.id, "old.txt", "content").await;

    let renamed = app
        .file_service
        .rename(&app.admin(), entry.id, "new.txt")
        .unwrap();

    assert_eq!(renamed.name, "new.txt");
    assert_eq!(renamed.storage_path, entry.storage_path);
    assert!(Path::new(&renamed.storage_path).is_file());
}

#[tokio::test]
async fn replace_content_swaps_physical_file() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let entry = app.put_file(docs.id, "doc.txt", "version one").await;

    let replaced = app
        .file_service
        .replace_content(
            &app.admin(),
            entry.id,
            UploadedFile {
                name: "doc-v2.txt".to_string(),
                bytes: Bytes::from("v2"),
            },
        )
        .await
        .unwrap();

    assert_eq!(replaced.id, entry.id);
    assert_eq!(replaced.name, "doc-v2.txt");
    assert_eq!(replaced.size_bytes, 2);
    assert!(!Path::new(&entry.storage_path).exists());
    assert!(Path::new(&replaced.storage_path).is_file());
}

#[tokio::test]
async fn move_file_auto_resolves_collisions() {
    let app = TestApp::new().await;
    let a = app.mkdir("A", None).await;
    let b = app.mkdir("B", None).await;
    let existing = app.put_file(b.id, "report.pdf", "already here").await;
    let moving = app.put_file(a.id, "report.pdf", "incoming").await;

    let moved = app
        .file_service
        .move_file(&app.admin(), moving.id, b.id)
        .await
        .unwrap();

    assert_eq!(moved.folder_id, b.id);
    assert_eq!(app.files.list_in_folder(b.id).len(), 2);
    assert!(Path::new(&existing.storage_path).is_file());
    assert!(Path::new(&moved.storage_path).is_file());
    assert!(app.files.list_in_folder(a.id).is_empty());
}

#[tokio::test]
async fn copy_file_leaves_source_untouched() {
    let app = TestApp::new().await;
    let a = app.mkdir("A", None).await;
    let b = app.mkdir("B", None).await;
    let source = app.put_file(a.id, "spec.txt", "spec").await;

    let copy = app
        .file_service
        .copy_file(&app.admin(), source.id, b.id)
        .await
        .unwrap();

    assert_ne!(copy.id, source.id);
    assert_eq!(copy.name, "spec.txt");
    assert!(Path::new(&source.storage_path).is_file());
    assert!(Path::new(&copy.storage_path).is_file());
    assert_eq!(app.files.list_in_folder(a.id).len(), 1);
    assert_eq!(app.files.list_in_folder(b.id).len(), 1);
}

#[tokio::test]
async fn delete_removes_record_and_bytes() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let entry = app.put_file(docs.id, "gone.txt", "bye").await;

    let report = app
        .file_service
        .delete_file(&app.admin(), entry.id)
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert!(report.orphaned_paths.is_empty());
    assert!(app.files.find_by_id(entry.id).is_none());
    assert!(!Path::new(&entry.storage_path).exists());
}

#[tokio::test]
async fn delete_many_requires_access_to_every_file() {
    let app = TestApp::new().await;
    let open = app.mkdir("Open", None).await;
    let locked = app.mkdir("Locked", None).await;
    let visible = app.put_file(open.id, "a.txt", "a").await;
    let hidden = app.put_file(locked.id, "b.txt", "b").await;

    let user = app.user_with_roots(&[open.id]);
    let err = app
        .file_service
        .delete_many(&user, &[visible.id, hidden.id])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    // Nothing was deleted.
    assert!(app.files.find_by_id(visible.id).is_some());
    assert!(app.files.find_by_id(hidden.id).is_some());
}

#[tokio::test]
async fn delete_many_unknown_ids_is_not_found() {
    let app = TestApp::new().await;
    let err = app
        .file_service
        .delete_many(&app.admin(), &[uuid::Uuid::new_v4()])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_all_in_folder_tolerates_empty_folders() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let report = app
        .file_service
        .delete_all_in_folder(&app.admin(), docs.id)
        .await
        .unwrap();
    assert_eq!(report.deleted, 0);
}

#[tokio::test]
async fn search_filters_by_folder_access() {
    let app = TestApp::new().await;
    let open = app.mkdir("Open", None).await;
    let locked = app.mkdir("Locked", None).await;
    app.put_file(open.id, "Manual-2024.pdf", "m").await;
    app.put_file(locked.id, "manual-secret.pdf", "s").await;

    let user = app.user_with_roots(&[open.id]);
    let result = app
        .file_service
        .search(&user, "manual", &PageRequest::default())
        .unwrap();
    assert_eq!(result.total_items, 1);
    assert_eq!(result.items[0].name, "Manual-2024.pdf");

    let all = app
        .file_service
        .search(&app.admin(), "MANUAL", &PageRequest::default())
        .unwrap();
    assert_eq!(all.total_items, 2);
}
