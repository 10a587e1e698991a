//! Folder access evaluation.

pub mod evaluator;

pub use evaluator::{AccessEvaluator, AccessMode};
