//! File entry operations.

pub mod service;

pub use service::{BatchUploadOutcome, FileDeleteReport, FileService, UploadFailure, UploadedFile};
