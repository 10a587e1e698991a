//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "storage_root": state.vault.root().display().to_string(),
        "folders": state.folder_catalog.len(),
        "files": state.file_catalog.len(),
    }))
}
