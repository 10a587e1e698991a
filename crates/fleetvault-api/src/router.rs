//! Route definitions for the FleetVault HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.storage.max_upload_size_bytes as usize;

    let api_routes = Router::new()
        .merge(folder_routes())
        .merge(file_routes())
        .merge(browse_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state))
        .with_state(state)
}

/// Folder CRUD, tree upload, zip download.
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders", get(handlers::folder::list_root_folders))
        .route("/folders", post(handlers::folder::create_folder))
        .route("/folders/search", get(handlers::folder::search_folders))
        .route("/folders/{id}", get(handlers::folder::get_folder))
        .route("/folders/{id}", patch(handlers::folder::rename_folder))
        .route("/folders/{id}", delete(handlers::folder::delete_folder))
        .route(
            "/folders/{id}/subfolders",
            get(handlers::folder::list_subfolders),
        )
        .route("/folders/{id}/move", put(handlers::folder::move_folder))
        .route("/folders/{id}/tree", post(handlers::folder::upload_tree))
        .route(
            "/folders/{id}/substitute",
            put(handlers::folder::substitute_folder),
        )
        .route(
            "/folders/{id}/download",
            get(handlers::folder::download_folder),
        )
}

/// File upload, download, CRUD, search.
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files/upload/{folder_id}", post(handlers::file::upload_file))
        .route(
            "/files/upload-many/{folder_id}",
            post(handlers::file::upload_many),
        )
        .route("/files/folder/{folder_id}", get(handlers::file::list_files))
        .route(
            "/files/folder/{folder_id}",
            delete(handlers::file::delete_folder_files),
        )
        .route("/files/search", get(handlers::file::search_files))
        .route("/files/{id}/download", get(handlers::file::download_file))
        .route("/files/{id}/view", get(handlers::file::view_file))
        .route("/files/{id}", patch(handlers::file::rename_file))
        .route("/files/{id}", delete(handlers::file::delete_file))
        .route(
            "/files/{id}/substitute",
            put(handlers::file::substitute_file),
        )
        .route("/files/{id}/move", put(handlers::file::move_file))
        .route("/files/{id}/copy", post(handlers::file::copy_file))
        .route("/files", delete(handlers::file::delete_files))
}

/// Path-addressed physical views.
fn browse_routes() -> Router<AppState> {
    Router::new()
        .route("/browse", get(handlers::browse::browse))
        .route("/browse/download", get(handlers::browse::download))
        .route("/browse/view", get(handlers::browse::view))
}

/// Liveness probe.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins = &state.config.server.cors.allowed_origins;
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<axum::http::HeaderValue> =
            origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(parsed)
    }
}
