//! GPU vertex/index/uniform buffers for one surface mesh

use bytemuck::{Pod, Zeroable};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::mesh::geometry::{SurfaceGeometry, SurfaceVertex};

/// Model matrix uniform (64 bytes, must match the surface shader struct)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ModelUniform {
    /// Object-to-render-space transform, pre-transposed for the shader
    pub model: [[f32; 4]; 4],
}

/// Vertex attributes for [`SurfaceVertex`]: position + color
pub const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// Vertex buffer layout host pipelines bind for surface meshes
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SurfaceVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Shared GPU handles the registry needs to build per-surface resources.
///
/// The device and queue are externally owned; this only adds the bind group
/// layout for the per-surface model uniform, which host pipelines include in
/// their pipeline layout at group 0.
#[derive(Clone)]
pub struct GpuLink {
    device: wgpu::Device,
    queue: wgpu::Queue,
    model_layout: wgpu::BindGroupLayout,
}

impl GpuLink {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("surface_model_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        Self { device, queue, model_layout }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Layout for the per-surface model uniform (bind group 0)
    pub fn model_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.model_layout
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    index_count: u32,
}

impl GpuMesh {
    fn new(link: &GpuLink, geometry: &SurfaceGeometry) -> Result<Self> {
        let device = link.device();
        let vertex_bytes: &[u8] = bytemuck::cast_slice(geometry.vertices());
        let index_bytes: &[u8] = bytemuck::cast_slice(geometry.indices());

        let max = device.limits().max_buffer_size;
        if vertex_bytes.len() as u64 > max || index_bytes.len() as u64 > max {
            return Err(Error::Gpu(format!(
                "surface mesh ({} vertex bytes, {} index bytes) exceeds max_buffer_size {}",
                vertex_bytes.len(),
                index_bytes.len(),
                max
            )));
        }

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("surface_vertices"),
            size: vertex_bytes.len() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        link.queue().write_buffer(&vertex_buffer, 0, vertex_bytes);

        // Copies must be in 4-byte units; u16 index data can end on a 2-byte
        // boundary, so pad the staging copy.
        let padded = index_bytes.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize);
        let mut index_data = index_bytes.to_vec();
        index_data.resize(padded, 0);

        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("surface_indices"),
            size: padded as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        link.queue().write_buffer(&index_buffer, 0, &index_data);

        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("surface_model"),
            size: std::mem::size_of::<ModelUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("surface_model_bind_group"),
            layout: link.model_bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            vertex_buffer,
            index_buffer,
            model_buffer,
            model_bind_group,
            index_count: geometry.indices().len() as u32,
        })
    }
}

/// One surface's renderable geometry plus its GPU-side buffers.
///
/// The GPU half is absent until a device is attached (and for empty meshes);
/// draw and upload are no-ops without it.
pub struct SurfaceMeshBuffer {
    geometry: SurfaceGeometry,
    gpu: Option<GpuMesh>,
}

impl SurfaceMeshBuffer {
    pub fn new(geometry: SurfaceGeometry, gpu: Option<&GpuLink>) -> Result<Self> {
        let gpu = match gpu {
            Some(link) if !geometry.is_empty() => Some(GpuMesh::new(link, &geometry)?),
            _ => None,
        };
        Ok(Self { geometry, gpu })
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn has_device_resources(&self) -> bool {
        self.gpu.is_some()
    }

    /// Push the model transform into the GPU constant buffer.
    pub fn write_model(&self, queue: &wgpu::Queue) {
        if let Some(gpu) = &self.gpu {
            let uniform = ModelUniform { model: self.geometry.model().to_cols_array_2d() };
            queue.write_buffer(&gpu.model_buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    /// Issue the instanced indexed draw for this surface.
    ///
    /// Two instances are drawn so a stereo pipeline can cover both eyes in a
    /// single call. Shader and pipeline state stay with the caller; only the
    /// model bind group (group 0) and the vertex/index bindings are set here.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(gpu) = &self.gpu else { return };
        pass.set_bind_group(0, &gpu.model_bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..gpu.index_count, 0, 0..2);
    }

    /// Free GPU buffers immediately instead of waiting for drop.
    ///
    /// Used on the device-lost path where deferred destruction never runs.
    pub fn destroy_device_resources(&self) {
        if let Some(gpu) = &self.gpu {
            gpu.vertex_buffer.destroy();
            gpu.index_buffer.destroy();
            gpu.model_buffer.destroy();
        }
    }
}
