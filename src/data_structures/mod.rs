//! Core data types for imported models.
//!
//! - `model` contains vertex, mesh, material and model definitions together
//!   with the draw-submission trait for render passes
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod model;
pub mod texture;
