//! Per-frame registry glue: constant uploads and draw submission

use std::sync::Arc;

use crate::registry::SurfaceRegistry;

/// Iterates the registry's current snapshot once per frame.
///
/// `update` pushes constant data for meshes flagged dirty; `render` issues
/// draw calls over whatever snapshot is current. Both are no-ops until the
/// registry holds surfaces with device resources, so the host can call them
/// unconditionally from its frame loop.
pub struct SurfacePass {
    registry: Arc<SurfaceRegistry>,
}

impl SurfacePass {
    pub fn new(registry: Arc<SurfaceRegistry>) -> Self {
        Self { registry }
    }

    /// Upload constant data for every dirty mesh. Cheap when nothing changed.
    pub fn update(&self, queue: &wgpu::Queue) {
        for record in self.registry.dirty_snapshot() {
            record.upload(queue);
        }
    }

    /// Draw every tracked surface with the caller's bound pipeline state.
    ///
    /// The pass iterates one atomically taken snapshot; reconciliation and
    /// pruning running concurrently cannot disturb it.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        for record in self.registry.snapshot() {
            record.mesh().draw(pass);
        }
    }

    /// Device-lost hook: drop all device resources and empty the registry.
    pub fn release_device_resources(&self) {
        self.registry.release_device_resources();
    }

    pub fn registry(&self) -> &Arc<SurfaceRegistry> {
        &self.registry
    }
}
