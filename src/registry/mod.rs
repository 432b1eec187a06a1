//! Concurrency-safe store of tracked surfaces and their renderable geometry
//!
//! Every mutation builds a replacement id-to-record map off to the side and
//! swaps it in atomically. Readers clone an `Arc` to the published map and
//! never observe a partial update; mutators serialize through a single
//! writer lock. Update acceptance is last-writer-wins by source stamp, so
//! asynchronous mesh completions may land in any order.

pub mod record;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use crate::core::types::{Result, SpaceId, SurfaceId, TransformSource, UpdateStamp};
use crate::mesh::geometry::SurfaceGeometry;
use crate::mesh::raw::RawSurfaceMesh;
use crate::render::buffer::mesh_buffer::{GpuLink, SurfaceMeshBuffer};

pub use record::SurfaceRecord;

type SurfaceMap = HashMap<SurfaceId, Arc<SurfaceRecord>>;

/// What `reconcile` did with an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// First accepted mesh for this id
    Added,
    /// A strictly newer mesh replaced the tracked one
    Updated,
    /// Stamp was not newer than the tracked record; update discarded
    Stale,
    /// The source produced no mesh; nothing changed
    Skipped,
}

/// Registry configuration: the render coordinate space and how to reach it.
pub struct RegistryConfig {
    /// Coordinate space all meshes are transformed into
    pub render_space: SpaceId,
    /// Transform lookup between coordinate spaces
    pub transforms: Arc<dyn TransformSource>,
}

/// Authoritative store of all tracked surfaces.
pub struct SurfaceRegistry {
    /// Published map; replaced wholesale under `writer`, never mutated in place
    published: RwLock<Arc<SurfaceMap>>,
    /// Serializes mutators; snapshot readers never take this
    writer: Mutex<()>,
    /// GPU handles, absent until a device is attached
    gpu: RwLock<Option<GpuLink>>,
    render_space: SpaceId,
    transforms: Arc<dyn TransformSource>,
}

impl SurfaceRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            published: RwLock::new(Arc::new(SurfaceMap::new())),
            writer: Mutex::new(()),
            gpu: RwLock::new(None),
            render_space: config.render_space,
            transforms: config.transforms,
        }
    }

    /// Attach GPU handles and build device resources for every tracked
    /// surface from its retained geometry.
    ///
    /// Used at startup when ingestion races device bring-up, and on resume
    /// after a device loss. A surface whose resources fail to build is
    /// dropped and logged; the rest survive.
    pub fn attach_device(&self, link: GpuLink) {
        let _guard = self.writer.lock().unwrap();
        *self.gpu.write().unwrap() = Some(link.clone());

        let current = self.published_map();
        let mut next = SurfaceMap::with_capacity(current.len());
        for (id, record) in current.iter() {
            match SurfaceMeshBuffer::new(record.mesh().geometry().clone(), Some(&link)) {
                Ok(mesh) => {
                    next.insert(*id, Arc::new(SurfaceRecord::new(*id, record.updated_at(), mesh)));
                }
                Err(err) => {
                    log::warn!("surface {id}: dropped while rebuilding device resources: {err}");
                }
            }
        }
        self.publish(next);
    }

    /// Apply one surface update.
    ///
    /// A missing mesh means the source declined to compute one (insufficient
    /// trust or density) and is a routine no-op. An update whose stamp is not
    /// strictly newer than the tracked record is discarded silently; stale
    /// completions are expected under overlapping notifications. Malformed
    /// mesh data is reported to the caller and changes nothing.
    pub fn reconcile(
        &self,
        id: SurfaceId,
        raw: Option<&RawSurfaceMesh>,
        stamp: UpdateStamp,
    ) -> Result<ReconcileOutcome> {
        let Some(raw) = raw else {
            return Ok(ReconcileOutcome::Skipped);
        };

        // Cheap pre-check so stale completions skip conversion entirely;
        // re-checked under the writer lock before publishing.
        if self.is_stale(id, stamp) {
            return Ok(ReconcileOutcome::Stale);
        }

        // Conversion and buffer creation happen outside the writer section;
        // only the map swap needs exclusivity.
        let geometry = SurfaceGeometry::from_raw(raw, self.render_space, self.transforms.as_ref())?;
        let link = self.gpu.read().unwrap().clone();
        let mesh = SurfaceMeshBuffer::new(geometry, link.as_ref())?;

        let _guard = self.writer.lock().unwrap();
        let current = self.published_map();
        let outcome = match current.get(&id) {
            Some(existing) if stamp <= existing.updated_at() => {
                return Ok(ReconcileOutcome::Stale);
            }
            Some(_) => ReconcileOutcome::Updated,
            None => ReconcileOutcome::Added,
        };

        let mut next = (*current).clone();
        next.insert(id, Arc::new(SurfaceRecord::new(id, stamp, mesh)));
        self.publish(next);
        Ok(outcome)
    }

    /// Drop every tracked surface whose id is absent from `live`.
    ///
    /// Idempotent, and safe to call while reconciles for other ids are in
    /// flight. GPU resources of removed records are freed once the last
    /// snapshot holding them drops, so an in-flight render pass over an
    /// older snapshot is unaffected.
    pub fn prune(&self, live: &HashSet<SurfaceId>) {
        let _guard = self.writer.lock().unwrap();
        let current = self.published_map();
        if current.keys().all(|id| live.contains(id)) {
            return;
        }

        let mut next = (*current).clone();
        next.retain(|id, _| {
            let keep = live.contains(id);
            if !keep {
                log::debug!("surface {id}: pruned");
            }
            keep
        });
        self.publish(next);
    }

    /// Immutable point-in-time view of all tracked surfaces.
    pub fn snapshot(&self) -> Vec<Arc<SurfaceRecord>> {
        self.published_map().values().cloned().collect()
    }

    /// Tracked surfaces whose GPU constant data still needs an upload.
    pub fn dirty_snapshot(&self) -> Vec<Arc<SurfaceRecord>> {
        self.published_map()
            .values()
            .filter(|record| record.needs_upload())
            .cloned()
            .collect()
    }

    pub fn get(&self, id: SurfaceId) -> Option<Arc<SurfaceRecord>> {
        self.published_map().get(&id).cloned()
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.published_map().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.published_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.published_map().is_empty()
    }

    /// Destroy every surface's GPU resources and empty the registry.
    ///
    /// Device-lost/suspend hook. Buffers are destroyed eagerly because the
    /// device may never process a deferred drop; the host must stop issuing
    /// draws from older snapshots before calling this.
    pub fn release_device_resources(&self) {
        let _guard = self.writer.lock().unwrap();
        *self.gpu.write().unwrap() = None;

        let current = self.published_map();
        self.publish(SurfaceMap::new());
        for record in current.values() {
            record.release_device_resources();
        }
        log::debug!("released device resources for {} surfaces", current.len());
    }

    /// Whether a device is currently attached.
    pub fn has_device(&self) -> bool {
        self.gpu.read().unwrap().is_some()
    }

    fn is_stale(&self, id: SurfaceId, stamp: UpdateStamp) -> bool {
        self.published_map()
            .get(&id)
            .is_some_and(|record| stamp <= record.updated_at())
    }

    fn published_map(&self) -> Arc<SurfaceMap> {
        self.published.read().unwrap().clone()
    }

    fn publish(&self, next: SurfaceMap) {
        *self.published.write().unwrap() = Arc::new(next);
    }
}
