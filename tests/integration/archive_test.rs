//! Zip download integration tests.

use std::io::Read;
use std::path::Path;

use crate::integration::helpers::TestApp;

#[tokio::test]
async fn zip_contains_folders_and_files() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let year = app.mkdir("2024", Some(docs.id)).await;
    app.put_file(year.id, "report.pdf", "pdf bytes").await;

    let handle = app.archive_service.build_zip(&app.admin(), docs.id).unwrap();
    assert_eq!(handle.file_name(), "Docs.zip");

    let mut archive = zip::ZipArchive::new(handle.reopen().unwrap()).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();

    assert!(names.contains(&"Docs/".to_string()));
    assert!(names.contains(&"Docs/2024/".to_string()));
    assert!(names.contains(&"Docs/2024/report.pdf".to_string()));

    let mut content = String::new();
    archive
        .by_name("Docs/2024/report.pdf")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "pdf bytes");
}

#[tokio::test]
async fn empty_folders_survive_the_archive() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    app.mkdir("empty", Some(docs.id)).await;

    let handle = app.archive_service.build_zip(&app.admin(), docs.id).unwrap();
    let mut archive = zip::ZipArchive::new(handle.reopen().unwrap()).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(names.contains(&"Docs/empty/".to_string()));
}

#[tokio::test]
async fn missing_physical_files_are_skipped_not_fatal() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;
    let ghost = app.put_file(docs.id, "ghost.txt", "boo").await;
    let alive = app.put_file(docs.id, "alive.txt", "ok").await;

    // Lose the bytes behind the catalog's back.
    std::fs::remove_file(Path::new(&ghost.storage_path)).unwrap();

    let handle = app.archive_service.build_zip(&app.admin(), docs.id).unwrap();
    let mut archive = zip::ZipArchive::new(handle.reopen().unwrap()).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();

    assert!(!names.iter().any(|n| n.ends_with("ghost.txt")));
    assert!(names.contains(&format!("Docs/{}", alive.name)));
}

#[tokio::test]
async fn zip_requires_read_access() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let err = app
        .archive_service
        .build_zip(&app.stranger(), docs.id)
        .unwrap_err();
    assert_eq!(err.kind, fleetvault_core::error::ErrorKind::Forbidden);
}

#[tokio::test]
async fn temp_archive_is_cleaned_up_on_drop() {
    let app = TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let handle = app.archive_service.build_zip(&app.admin(), docs.id).unwrap();
    let path = handle.path().to_path_buf();
    assert!(path.exists());
    drop(handle);
    assert!(!path.exists());
}
