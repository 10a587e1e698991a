//! # fleetvault-core
//!
//! Core crate for FleetVault. Contains configuration schemas,
//! pagination/sorting types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other FleetVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
