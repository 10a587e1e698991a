//! Physical-view handlers: path-addressed listing, download, and view.

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;

use fleetvault_core::error::AppError;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

fn path_param(params: &std::collections::HashMap<String, String>) -> String {
    params.get("path").cloned().unwrap_or_default()
}

/// GET /api/browse?path=... — recursive physical listing, reconciled
/// into the catalog before serving.
pub async fn browse(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let items = state.browse_service.browse(&path_param(&params)).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": items })))
}

/// GET /api/browse/download?path=... — path-addressed attachment download.
pub async fn download(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let (location, name) = state
        .browse_service
        .resolve_download(&path_param(&params))
        .await?;

    let file = tokio::fs::File::open(&location)
        .await
        .map_err(|_| AppError::not_found("File not found"))?;
    let stream = ReaderStream::new(file);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::from(AppError::internal(format!("Response build failed: {e}"))))
}

/// GET /api/browse/view?path=... — path-addressed inline view with a
/// sniffed content type.
pub async fn view(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let (location, mime) = state
        .browse_service
        .resolve_view(&path_param(&params))
        .await?;

    let file = tokio::fs::File::open(&location)
        .await
        .map_err(|_| AppError::not_found("File not found"))?;
    let stream = ReaderStream::new(file);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::from(AppError::internal(format!("Response build failed: {e}"))))
}
