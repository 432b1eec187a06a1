//! CPU-side conversion of raw mesh payloads into renderable geometry

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::core::error::Error;
use crate::core::types::{Result, SpaceId, TransformSource};
use crate::mesh::raw::{IndexStream, RawSurfaceMesh, VertexStream};

/// Placeholder vertex color used when the source supplies no normals
pub const PLACEHOLDER_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// Vertex layout shared with the surface shader (24 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SurfaceVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Vertex color; carries the surface normal when normals were requested
    pub color: [f32; 3],
}

/// Renderable geometry for one surface: vertex/index arrays plus the
/// object-to-render-space model transform.
#[derive(Clone, Debug)]
pub struct SurfaceGeometry {
    vertices: Vec<SurfaceVertex>,
    indices: Vec<u16>,
    model: Mat4,
}

impl SurfaceGeometry {
    /// Convert one raw mesh into GPU-ready arrays and a model transform.
    ///
    /// Fails on size/stride mismatches, an index count that is not a
    /// multiple of 3, or an out-of-range index. A failed conversion affects
    /// only the surface it came from.
    pub fn from_raw(
        raw: &RawSurfaceMesh,
        render_space: SpaceId,
        transforms: &dyn TransformSource,
    ) -> Result<Self> {
        let positions = decode_vec3_stream(&raw.positions, "position")?;

        let normals = match &raw.normals {
            Some(stream) => {
                let normals = decode_vec3_stream(stream, "normal")?;
                if normals.len() != positions.len() {
                    return Err(Error::MeshData(format!(
                        "normal count {} does not match vertex count {}",
                        normals.len(),
                        positions.len()
                    )));
                }
                Some(normals)
            }
            None => None,
        };

        let indices = decode_index_stream(&raw.indices, positions.len())?;

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, position)| SurfaceVertex {
                position: *position,
                color: normals.as_ref().map_or(PLACEHOLDER_COLOR, |n| n[i]),
            })
            .collect();

        // Identity fallback: an unknown transform leaves the mesh where the
        // source put it rather than dropping the surface.
        let to_render = transforms
            .try_transform(raw.space, render_space)
            .unwrap_or(Mat4::IDENTITY);
        let scale = Mat4::from_scale(Vec3::splat(raw.position_scale));
        // The surface shader multiplies with row vectors; the transpose is
        // part of that contract.
        let model = (to_render * scale).transpose();

        Ok(Self { vertices, indices, model })
    }

    pub fn vertices(&self) -> &[SurfaceVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn decode_vec3_stream(stream: &VertexStream, what: &str) -> Result<Vec<[f32; 3]>> {
    if stream.stride < 12 {
        return Err(Error::MeshData(format!(
            "{what} stride {} is smaller than one 3x f32 element",
            stream.stride
        )));
    }
    let needed = stream.stride * stream.count;
    if stream.data.len() < needed {
        return Err(Error::MeshData(format!(
            "{what} stream holds {} bytes but stride {} x count {} needs {}",
            stream.data.len(),
            stream.stride,
            stream.count,
            needed
        )));
    }

    let mut elements = Vec::with_capacity(stream.count);
    for i in 0..stream.count {
        let offset = i * stream.stride;
        elements.push([
            read_f32(&stream.data, offset),
            read_f32(&stream.data, offset + 4),
            read_f32(&stream.data, offset + 8),
        ]);
    }
    Ok(elements)
}

fn decode_index_stream(stream: &IndexStream, vertex_count: usize) -> Result<Vec<u16>> {
    if stream.count % 3 != 0 {
        return Err(Error::MeshData(format!(
            "index count {} is not a multiple of 3",
            stream.count
        )));
    }
    let needed = stream.count * 2;
    if stream.data.len() < needed {
        return Err(Error::MeshData(format!(
            "index stream holds {} bytes but count {} needs {}",
            stream.data.len(),
            stream.count,
            needed
        )));
    }

    let mut indices = Vec::with_capacity(stream.count);
    for i in 0..stream.count {
        let offset = i * 2;
        let index = u16::from_le_bytes([stream.data[offset], stream.data[offset + 1]]);
        if index as usize >= vertex_count {
            return Err(Error::MeshData(format!(
                "index {index} out of range for {vertex_count} vertices"
            )));
        }
        indices.push(index);
    }
    Ok(indices)
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IdentityTransforms;

    const RENDER_SPACE: SpaceId = SpaceId::from_raw(0);
    const MESH_SPACE: SpaceId = SpaceId::from_raw(7);

    fn quad_raw() -> RawSurfaceMesh {
        RawSurfaceMesh {
            space: MESH_SPACE,
            positions: VertexStream::from_vec3s(&[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ]),
            normals: None,
            indices: IndexStream::from_indices(&[0, 1, 2, 0, 2, 3]),
            position_scale: 1.0,
        }
    }

    #[test]
    fn test_decode_quad() {
        let geometry = SurfaceGeometry::from_raw(&quad_raw(), RENDER_SPACE, &IdentityTransforms)
            .expect("quad decodes");
        assert_eq!(geometry.vertices().len(), 4);
        assert_eq!(geometry.triangle_count(), 2);
        assert_eq!(geometry.vertices()[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(geometry.vertices()[0].color, PLACEHOLDER_COLOR);
    }

    #[test]
    fn test_decode_skips_stride_padding() {
        // 16-byte stride: 4 bytes of padding after each position
        let mut data = Vec::new();
        for position in [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]] {
            for component in position {
                data.extend_from_slice(&component.to_le_bytes());
            }
            data.extend_from_slice(&[0xAA; 4]);
        }
        let raw = RawSurfaceMesh {
            space: MESH_SPACE,
            positions: VertexStream::new(data, 16, 3),
            normals: None,
            indices: IndexStream::from_indices(&[0, 1, 2]),
            position_scale: 1.0,
        };

        let geometry = SurfaceGeometry::from_raw(&raw, RENDER_SPACE, &IdentityTransforms)
            .expect("padded stream decodes");
        assert_eq!(geometry.vertices()[1].position, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_normals_pass_through_color_channel() {
        let mut raw = quad_raw();
        raw.normals = Some(VertexStream::from_vec3s(&[
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]));

        let geometry = SurfaceGeometry::from_raw(&raw, RENDER_SPACE, &IdentityTransforms)
            .expect("quad with normals decodes");
        assert_eq!(geometry.vertices()[0].color, [0.0, 0.0, 1.0]);
        assert_eq!(geometry.vertices()[3].color, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_normal_count_mismatch_rejected() {
        let mut raw = quad_raw();
        raw.normals = Some(VertexStream::from_vec3s(&[[0.0, 0.0, 1.0]]));
        assert!(SurfaceGeometry::from_raw(&raw, RENDER_SPACE, &IdentityTransforms).is_err());
    }

    #[test]
    fn test_index_count_must_be_triangles() {
        let mut raw = quad_raw();
        raw.indices = IndexStream::from_indices(&[0, 1, 2, 3]);
        assert!(SurfaceGeometry::from_raw(&raw, RENDER_SPACE, &IdentityTransforms).is_err());
    }

    #[test]
    fn test_index_out_of_range_rejected() {
        let mut raw = quad_raw();
        raw.indices = IndexStream::from_indices(&[0, 1, 9]);
        assert!(SurfaceGeometry::from_raw(&raw, RENDER_SPACE, &IdentityTransforms).is_err());
    }

    #[test]
    fn test_truncated_streams_rejected() {
        let mut raw = quad_raw();
        raw.positions.count = 8; // more elements than the bytes can hold
        assert!(SurfaceGeometry::from_raw(&raw, RENDER_SPACE, &IdentityTransforms).is_err());

        let mut raw = quad_raw();
        raw.indices.data.truncate(4);
        assert!(SurfaceGeometry::from_raw(&raw, RENDER_SPACE, &IdentityTransforms).is_err());
    }

    #[test]
    fn test_model_transform_is_transposed() {
        struct Offset;
        impl TransformSource for Offset {
            fn try_transform(&self, _from: SpaceId, _to: SpaceId) -> Option<Mat4> {
                Some(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)))
            }
        }

        let mut raw = quad_raw();
        raw.position_scale = 2.0;
        let geometry =
            SurfaceGeometry::from_raw(&raw, RENDER_SPACE, &Offset).expect("quad decodes");

        let expected = (Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_scale(Vec3::splat(2.0)))
        .transpose();
        assert_eq!(geometry.model(), expected);
        // Translation lands in the last row after the transpose.
        assert_eq!(geometry.model().row(3), glam::Vec4::new(1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_unknown_transform_falls_back_to_identity() {
        struct Unrelated;
        impl TransformSource for Unrelated {
            fn try_transform(&self, _from: SpaceId, _to: SpaceId) -> Option<Mat4> {
                None
            }
        }

        let geometry = SurfaceGeometry::from_raw(&quad_raw(), RENDER_SPACE, &Unrelated)
            .expect("quad decodes");
        assert_eq!(geometry.model(), Mat4::IDENTITY);
    }
}
