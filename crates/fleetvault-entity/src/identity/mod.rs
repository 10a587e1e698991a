//! Authenticated identity passed in from the outer authentication layer.

pub mod model;
pub mod role;

pub use model::Identity;
pub use role::Role;
