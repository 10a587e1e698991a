//! # fleetvault-entity
//!
//! Domain entity models for FleetVault. Every struct in this crate
//! represents a catalog record or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod file;
pub mod folder;
pub mod identity;
