//! # fleetvault-api
//!
//! HTTP layer for FleetVault: Axum router, handlers, DTOs, and the
//! mapping from domain errors to HTTP responses. Authentication itself
//! happens upstream — the identity extractor consumes the headers the
//! gateway injects after verifying the caller.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::build_state;
pub use router::build_router;
pub use state::AppState;
