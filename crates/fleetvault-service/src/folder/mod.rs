//! Folder tree operations.

pub mod download;
pub mod service;

pub use download::ArchiveService;
pub use service::{
    CreateFolderRequest, FolderDeleteReport, FolderDetail, FolderService, TreeUploadFile,
    TreeUploadReport,
};
