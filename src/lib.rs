//! meshkit
//!
//! A small model-loading layer for wgpu renderers: import a 3D asset file
//! (Wavefront OBJ or glTF), flatten its scene graph into a flat list of
//! drawable meshes, cache and upload its textures, and submit draws through
//! an already-configured render pass. The crate owns no window, camera or
//! pipeline; it is meant to be embedded in a renderer that does.
//!
//! High-level modules
//! - `data_structures`: vertex/mesh/material/model types and GPU textures
//! - `resources`: helpers to import model files and create GPU resources
//!

pub mod data_structures;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
