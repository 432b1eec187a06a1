//! Per-surface record tracked by the registry

use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::types::{SurfaceId, UpdateStamp};
use crate::render::buffer::mesh_buffer::SurfaceMeshBuffer;

/// One tracked surface: identity, freshness, and renderable mesh.
///
/// Records are immutable once published, apart from the dirty flag. Geometry
/// changes always produce a replacement record, so a render pass iterating
/// an older snapshot never observes a rebuild in progress.
pub struct SurfaceRecord {
    id: SurfaceId,
    updated_at: UpdateStamp,
    needs_upload: AtomicBool,
    mesh: SurfaceMeshBuffer,
}

impl SurfaceRecord {
    pub(crate) fn new(id: SurfaceId, updated_at: UpdateStamp, mesh: SurfaceMeshBuffer) -> Self {
        Self {
            id,
            updated_at,
            needs_upload: AtomicBool::new(true),
            mesh,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Source stamp of the last accepted mesh; monotonically non-decreasing
    /// across the records published under this id.
    pub fn updated_at(&self) -> UpdateStamp {
        self.updated_at
    }

    /// True while GPU constant data has not been re-uploaded since the last
    /// accepted geometry change.
    pub fn needs_upload(&self) -> bool {
        self.needs_upload.load(Ordering::Acquire)
    }

    /// Claim the pending upload, clearing the dirty flag.
    ///
    /// Returns whether an upload was actually pending, so concurrent callers
    /// cannot double-upload.
    pub fn take_needs_upload(&self) -> bool {
        self.needs_upload.swap(false, Ordering::AcqRel)
    }

    pub fn mesh(&self) -> &SurfaceMeshBuffer {
        &self.mesh
    }

    /// Push constant data to the GPU if this record is dirty.
    ///
    /// Cheap when clean; safe to call every frame.
    pub fn upload(&self, queue: &wgpu::Queue) {
        if self.take_needs_upload() {
            self.mesh.write_model(queue);
        }
    }

    pub(crate) fn release_device_resources(&self) {
        self.mesh.destroy_device_resources();
    }
}
