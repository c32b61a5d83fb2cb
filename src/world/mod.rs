//! World module - meshes, models and scene files
//!
//! - Meshes own their triangles and never change after construction
//! - Models place a mesh in the world with an incremental transform
//! - Scenes are RON files describing the camera, frustum and models

mod mesh;
mod model;
mod scene;

pub use mesh::*;
pub use model::*;
pub use scene::*;
