//! Surface mesh payloads and geometry conversion

pub mod geometry;
pub mod raw;

pub use geometry::{SurfaceGeometry, SurfaceVertex};
pub use raw::{IndexStream, MeshComputeOptions, RawSurfaceMesh, VertexStream};
