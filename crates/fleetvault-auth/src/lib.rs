//! # fleetvault-auth
//!
//! Access control for the folder hierarchy: admin override, explicit
//! per-folder grants, inheritance down from any ancestor grant, and
//! root-folder grant lists.

pub mod access;

pub use access::{AccessEvaluator, AccessMode};
