//! File upload, download, and CRUD handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use uuid::Uuid;
use validator::Validate;

use fleetvault_core::error::AppError;
use fleetvault_service::file::service::UploadedFile;

use crate::dto::request::{
    CopyFileRequest, DeleteFilesRequest, MoveFileRequest, RenameFileRequest,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// POST /api/files/upload/{folder_id} — single multipart upload.
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(folder_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let mut files = collect_uploads(multipart).await?;
    let file = files
        .pop()
        .ok_or_else(|| AppError::validation("No file in upload"))?;

    let entry = state.file_service.upload(&auth, folder_id, file).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": entry })),
    ))
}

/// POST /api/files/upload-many/{folder_id} — bulk multipart upload.
pub async fn upload_many(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(folder_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let files = collect_uploads(multipart).await?;
    if files.is_empty() {
        return Err(AppError::validation("No files in upload").into());
    }

    let outcome = state.file_service.upload_many(&auth, folder_id, files).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": outcome })),
    ))
}

/// GET /api/files/folder/{folder_id}
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(folder_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = params.into_page_request();
    let files = state.file_service.list_files(&auth, folder_id, &page)?;
    Ok(Json(serde_json::json!({ "success": true, "data": files })))
}

/// GET /api/files/search?name=...
pub async fn search_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<std::collections::HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = filter
        .get("name")
        .ok_or_else(|| AppError::validation("name query parameter is required"))?;

    let page = params.into_page_request();
    let files = state.file_service.search(&auth, name, &page)?;
    Ok(Json(serde_json::json!({ "success": true, "data": files })))
}

/// GET /api/files/{id}/download — attachment download.
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (entry, stream) = state.file_service.download(&auth, id).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", entry.name),
        )
        .header(header::CONTENT_LENGTH, entry.size_bytes)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::from(AppError::internal(format!("Response build failed: {e}"))))
}

/// GET /api/files/{id}/view — inline view with a sniffed content type,
/// letting the browser decide how to render it.
pub async fn view_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (entry, stream, mime) = state.file_service.view(&auth, id).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, entry.size_bytes)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::from(AppError::internal(format!("Response build failed: {e}"))))
}

/// PATCH /api/files/{id}
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameFileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let entry = state.file_service.rename(&auth, id, &req.name)?;
    Ok(Json(serde_json::json!({ "success": true, "data": entry })))
}

/// PUT /api/files/{id}/substitute — replace content, keep the record.
pub async fn substitute_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut files = collect_uploads(multipart).await?;
    let replacement = files
        .pop()
        .ok_or_else(|| AppError::validation("No file in upload"))?;

    let entry = state
        .file_service
        .replace_content(&auth, id, replacement)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": entry })))
}

/// PUT /api/files/{id}/move
pub async fn move_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveFileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let entry = state
        .file_service
        .move_file(&auth, id, req.destination_folder_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": entry })))
}

/// POST /api/files/{id}/copy
pub async fn copy_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CopyFileRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let entry = state
        .file_service
        .copy_file(&auth, id, req.destination_folder_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": entry })),
    ))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state.file_service.delete_file(&auth, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": report })))
}

/// DELETE /api/files — bulk delete by id list.
pub async fn delete_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<DeleteFilesRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let report = state.file_service.delete_many(&auth, &req.file_ids).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": report })))
}

/// DELETE /api/files/folder/{folder_id} — delete every file in a folder.
pub async fn delete_folder_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(folder_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state
        .file_service
        .delete_all_in_folder(&auth, folder_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": report })))
}

/// Drain a multipart body into uploadable (name, bytes) pairs. The
/// display name is the trailing segment of the submitted filename.
async fn collect_uploads(mut multipart: Multipart) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let Some(file_name) = field.file_name().map(String::from) else {
            continue;
        };
        let name = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&file_name)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Multipart read error: {e}")))?;
        files.push(UploadedFile { name, bytes });
    }
    Ok(files)
}
