//! Raw surface mesh payloads as delivered by the perception source

use serde::{Deserialize, Serialize};

use crate::core::types::SpaceId;

/// Packed per-vertex attribute stream: raw bytes plus layout.
///
/// Elements are little-endian 3x f32 at `stride * i`; the stride may carry
/// trailing padding or interleaved attributes the decoder skips.
#[derive(Clone, Debug)]
pub struct VertexStream {
    pub data: Vec<u8>,
    /// Bytes between consecutive elements
    pub stride: usize,
    /// Number of elements in the stream
    pub count: usize,
}

impl VertexStream {
    pub fn new(data: Vec<u8>, stride: usize, count: usize) -> Self {
        Self { data, stride, count }
    }

    /// Pack a position array into a tightly strided stream (12-byte stride).
    pub fn from_vec3s(elements: &[[f32; 3]]) -> Self {
        let mut data = Vec::with_capacity(elements.len() * 12);
        for e in elements {
            for component in e {
                data.extend_from_slice(&component.to_le_bytes());
            }
        }
        Self { data, stride: 12, count: elements.len() }
    }
}

/// Packed 16-bit triangle index stream.
#[derive(Clone, Debug)]
pub struct IndexStream {
    pub data: Vec<u8>,
    /// Number of indices in the stream
    pub count: usize,
}

impl IndexStream {
    pub fn new(data: Vec<u8>, count: usize) -> Self {
        Self { data, count }
    }

    pub fn from_indices(indices: &[u16]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * 2);
        for index in indices {
            data.extend_from_slice(&index.to_le_bytes());
        }
        Self { data, count: indices.len() }
    }
}

/// One surface's triangle mesh at one point in time.
#[derive(Clone, Debug)]
pub struct RawSurfaceMesh {
    /// Coordinate space the positions are expressed in
    pub space: SpaceId,
    pub positions: VertexStream,
    /// Per-vertex normals, present when requested from the source
    pub normals: Option<VertexStream>,
    pub indices: IndexStream,
    /// Uniform scale applied to positions (sources quantize aggressively)
    pub position_scale: f32,
}

/// Options handed to the perception source for each mesh computation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshComputeOptions {
    /// Upper bound on triangle density, in triangles per cubic meter
    pub max_triangles_per_cubic_meter: f64,
    /// Request per-vertex normals in addition to positions
    pub include_normals: bool,
}

impl Default for MeshComputeOptions {
    fn default() -> Self {
        Self {
            max_triangles_per_cubic_meter: 1000.0,
            include_normals: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stream_packing() {
        let stream = VertexStream::from_vec3s(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(stream.count, 2);
        assert_eq!(stream.stride, 12);
        assert_eq!(stream.data.len(), 24);
        assert_eq!(f32::from_le_bytes([stream.data[12], stream.data[13], stream.data[14], stream.data[15]]), 4.0);
    }

    #[test]
    fn test_index_stream_packing() {
        let stream = IndexStream::from_indices(&[0, 1, 2]);
        assert_eq!(stream.count, 3);
        assert_eq!(stream.data, vec![0, 0, 1, 0, 2, 0]);
    }

    #[test]
    fn test_compute_options_defaults() {
        let options = MeshComputeOptions::default();
        assert_eq!(options.max_triangles_per_cubic_meter, 1000.0);
        assert!(options.include_normals);
    }
}
