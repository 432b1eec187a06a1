//! Adapter between the spatial perception source and the registry
//!
//! Each "surfaces changed" notification enumerates the observed surfaces,
//! fans mesh computation out across blocking tasks, reconciles completions
//! as they land, and finally prunes ids that left the observed volume.
//! Overlapping notifications need no extra coordination: the registry's
//! stamp tie-break discards stale completions and prune is idempotent.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::core::types::{Result, SurfaceId, UpdateStamp};
use crate::mesh::raw::{MeshComputeOptions, RawSurfaceMesh};
use crate::registry::{ReconcileOutcome, SurfaceRegistry};

/// Axis-aligned box, in render space, limiting which surfaces are observed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ObservationVolume {
    pub center: [f32; 3],
    pub extents: [f32; 3],
}

impl Default for ObservationVolume {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            extents: [10.0; 3],
        }
    }
}

/// Ingest configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    pub volume: ObservationVolume,
    pub compute: MeshComputeOptions,
}

/// One observed surface as reported by the perception source.
pub trait ObservedSurface: Send + Sync {
    fn id(&self) -> SurfaceId;

    /// Source stamp of the latest available mesh for this surface.
    fn updated_at(&self) -> UpdateStamp;

    /// Compute the current mesh within the density budget.
    ///
    /// `Ok(None)` means the source declined (insufficient trust or density);
    /// that is routine, not an error. May block for the source's quality
    /// budget, so callers run it on a blocking task.
    fn compute_mesh(&self, options: &MeshComputeOptions) -> Result<Option<RawSurfaceMesh>>;
}

/// The spatial perception source the ingestor adapts.
pub trait PerceptionSource: Send + Sync {
    /// Ask the platform for access to spatial data.
    ///
    /// Denial is fatal to the whole ingestor and surfaces as a construction
    /// failure; it is never retried automatically.
    fn request_access(&self) -> Result<()>;

    /// Restrict observation to the given volume.
    fn set_observation_volume(&self, volume: &ObservationVolume);

    /// Enumerate the currently observed surfaces.
    fn observed_surfaces(&self) -> Vec<Arc<dyn ObservedSurface>>;
}

/// Feeds perception-source notifications into a [`SurfaceRegistry`].
pub struct SurfaceIngestor {
    registry: Arc<SurfaceRegistry>,
    source: Arc<dyn PerceptionSource>,
    config: IngestConfig,
}

impl SurfaceIngestor {
    /// Create the ingestor, requesting perception access up front.
    pub fn new(
        registry: Arc<SurfaceRegistry>,
        source: Arc<dyn PerceptionSource>,
        config: IngestConfig,
    ) -> Result<Self> {
        source.request_access()?;
        source.set_observation_volume(&config.volume);
        Ok(Self { registry, source, config })
    }

    /// Handle one "surfaces changed" notification end to end.
    ///
    /// Per-surface failures (malformed data, resource creation) drop that
    /// surface only and are logged; ingestion of the rest continues.
    pub async fn surfaces_changed(&self) {
        let surfaces = self.source.observed_surfaces();
        let live: HashSet<SurfaceId> = surfaces.iter().map(|surface| surface.id()).collect();
        log::debug!("surfaces changed: {} observed", surfaces.len());

        let mut tasks = JoinSet::new();
        for surface in surfaces {
            let options = self.config.compute.clone();
            let registry = Arc::clone(&self.registry);
            tasks.spawn_blocking(move || {
                let id = surface.id();
                let stamp = surface.updated_at();
                match surface.compute_mesh(&options) {
                    Ok(raw) => match registry.reconcile(id, raw.as_ref(), stamp) {
                        Ok(outcome) => log_outcome(id, outcome),
                        Err(err) => log::warn!("surface {id}: update dropped: {err}"),
                    },
                    Err(err) => log::warn!("surface {id}: mesh computation failed: {err}"),
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                log::error!("mesh compute task failed: {err}");
            }
        }

        self.registry.prune(&live);
    }

    pub fn registry(&self) -> &Arc<SurfaceRegistry> {
        &self.registry
    }
}

fn log_outcome(id: SurfaceId, outcome: ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Added => log::debug!("surface {id}: tracked"),
        ReconcileOutcome::Updated => log::debug!("surface {id}: updated"),
        ReconcileOutcome::Stale => log::trace!("surface {id}: stale completion discarded"),
        ReconcileOutcome::Skipped => log::trace!("surface {id}: no mesh available"),
    }
}
