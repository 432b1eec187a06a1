//! GPU buffer wrappers

pub mod mesh_buffer;

pub use mesh_buffer::{GpuLink, ModelUniform, SurfaceMeshBuffer};
