//! Folder CRUD, tree upload, and zip download handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use uuid::Uuid;
use validator::Validate;

use fleetvault_core::error::AppError;
use fleetvault_service::folder::service::{
    CreateFolderRequest as SvcCreateFolder, TreeUploadFile,
};

use crate::dto::request::{CreateFolderRequest, MoveFolderRequest, RenameFolderRequest};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/folders
pub async fn list_root_folders(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = params.into_page_request();
    let folders = state.folder_service.list_root_folders(&auth, &page);
    Ok(Json(
        serde_json::json!({ "success": true, "data": folders }),
    ))
}

/// GET /api/folders/search?name=...
pub async fn search_folders(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<std::collections::HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = filter
        .get("name")
        .ok_or_else(|| AppError::validation("name query parameter is required"))?;

    let page = params.into_page_request();
    let folders = state.folder_service.search_folders(&auth, name, &page);
    Ok(Json(
        serde_json::json!({ "success": true, "data": folders }),
    ))
}

/// GET /api/folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let detail = state.folder_service.get_folder(&auth, id)?;
    Ok(Json(serde_json::json!({ "success": true, "data": detail })))
}

/// GET /api/folders/{id}/subfolders
pub async fn list_subfolders(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = params.into_page_request();
    let subfolders = state.folder_service.list_subfolders(&auth, id, &page)?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": subfolders }),
    ))
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let folder = state
        .folder_service
        .create_folder(
            &auth,
            SvcCreateFolder {
                name: req.name,
                parent_id: req.parent_id,
                granted_user_ids: req.granted_user_ids,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": folder })),
    ))
}

/// PATCH /api/folders/{id}
pub async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameFolderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let folder = state.folder_service.rename_folder(&auth, id, &req.name).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": folder })))
}

/// PUT /api/folders/{id}/move
pub async fn move_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveFolderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let folder = state
        .folder_service
        .move_folder(&auth, id, req.destination_parent_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": folder })))
}

/// DELETE /api/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state.folder_service.delete_folder(&auth, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": report })))
}

/// POST /api/folders/{id}/tree — multipart directory-structure upload.
///
/// Each part's filename carries the path relative to the target folder
/// (the way browsers submit a directory picker).
pub async fn upload_tree(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uploads = collect_tree_files(multipart).await?;
    let report = state.folder_service.upload_tree(&auth, id, uploads).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": report })))
}

/// PUT /api/folders/{id}/substitute — replace folder content with a
/// freshly uploaded tree.
pub async fn substitute_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uploads = collect_tree_files(multipart).await?;
    let report = state
        .folder_service
        .substitute_folder(&auth, id, uploads)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": report })))
}

/// GET /api/folders/{id}/download — zip of the whole subtree.
pub async fn download_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let handle = state.archive_service.build_zip(&auth, id)?;
    let file_name = handle.file_name().to_string();

    // An independent descriptor keeps the unlinked temp file readable
    // until the stream finishes; the handle can go away immediately.
    let file = handle.reopen()?;
    drop(handle);
    let stream = ReaderStream::new(tokio::fs::File::from_std(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::from(AppError::internal(format!("Response build failed: {e}"))))
}

/// Drain a multipart body into relative-path + bytes pairs.
async fn collect_tree_files(mut multipart: Multipart) -> Result<Vec<TreeUploadFile>, AppError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let Some(relative_path) = field.file_name().map(String::from) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Multipart read error: {e}")))?;
        uploads.push(TreeUploadFile {
            relative_path,
            bytes,
        });
    }
    Ok(uploads)
}
