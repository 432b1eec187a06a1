//! Rendering system and GPU interfaces

pub mod buffer;
pub mod context;
pub mod surface_pass;

pub use context::GpuContext;
pub use surface_pass::SurfacePass;
