//! GPU context management using wgpu

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::buffer::mesh_buffer::GpuLink;

/// Headless GPU context for hosts that do not bring their own device.
///
/// The windowing host normally supplies the device and queue; this exists
/// for tools and tests that only need buffer creation and uploads.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a new GPU context without a window surface.
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::Gpu(format!("no suitable adapter found: {e:?}")))?;

        let adapter_limits = adapter.limits();

        let device_desc = wgpu::DeviceDescriptor {
            label: Some("surfmap_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            experimental_features: Default::default(),
            trace: Default::default(),
        };

        let (device, queue) = adapter
            .request_device(&device_desc)
            .await
            .map_err(|e| Error::Gpu(e.to_string()))?;

        log::info!(
            "GPU buffer limits: max_buffer_size={}MB",
            adapter_limits.max_buffer_size / 1024 / 1024
        );

        Ok(Self { instance, adapter, device, queue })
    }

    /// GPU handles for building per-surface mesh resources.
    pub fn link(&self) -> GpuLink {
        GpuLink::new(self.device.clone(), self.queue.clone())
    }
}
