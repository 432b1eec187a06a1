//! Synthetic surface observation demo
//!
//! Drives generated surfaces through the full ingest -> reconcile -> prune
//! cycle and reports registry state. Attaches a GPU device when one is
//! available so dirty meshes actually get their constant data uploaded;
//! without one the registry still tracks geometry.
//!
//! Usage: observe [config.json]

use std::sync::{Arc, Mutex};

use surfmap::core::logging;
use surfmap::core::types::{
    IdentityTransforms, Result, SpaceId, SurfaceId, UpdateStamp,
};
use surfmap::ingest::{
    IngestConfig, ObservationVolume, ObservedSurface, PerceptionSource, SurfaceIngestor,
};
use surfmap::mesh::raw::{IndexStream, MeshComputeOptions, RawSurfaceMesh, VertexStream};
use surfmap::registry::{RegistryConfig, SurfaceRegistry};
use surfmap::render::{GpuContext, SurfacePass};

const WORLD_SPACE: SpaceId = SpaceId::from_raw(0);

struct SyntheticSurface {
    id: SurfaceId,
    stamp: UpdateStamp,
    positions: Vec<[f32; 3]>,
    indices: Vec<u16>,
}

impl ObservedSurface for SyntheticSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn updated_at(&self) -> UpdateStamp {
        self.stamp
    }

    fn compute_mesh(&self, _options: &MeshComputeOptions) -> Result<Option<RawSurfaceMesh>> {
        Ok(Some(RawSurfaceMesh {
            space: WORLD_SPACE,
            positions: VertexStream::from_vec3s(&self.positions),
            normals: None,
            indices: IndexStream::from_indices(&self.indices),
            position_scale: 1.0,
        }))
    }
}

#[derive(Default)]
struct SyntheticSource {
    surfaces: Mutex<Vec<Arc<SyntheticSurface>>>,
}

impl SyntheticSource {
    fn set_surfaces(&self, surfaces: Vec<SyntheticSurface>) {
        *self.surfaces.lock().unwrap() = surfaces.into_iter().map(Arc::new).collect();
    }
}

impl PerceptionSource for SyntheticSource {
    fn request_access(&self) -> Result<()> {
        Ok(())
    }

    fn set_observation_volume(&self, volume: &ObservationVolume) {
        log::info!(
            "observing {}x{}x{}m around {:?}",
            volume.extents[0], volume.extents[1], volume.extents[2], volume.center
        );
    }

    fn observed_surfaces(&self) -> Vec<Arc<dyn ObservedSurface>> {
        self.surfaces
            .lock()
            .unwrap()
            .iter()
            .map(|surface| Arc::clone(surface) as Arc<dyn ObservedSurface>)
            .collect()
    }
}

fn quad(id: u128, stamp: u64, base: [f32; 3], up: [f32; 3], right: [f32; 3]) -> SyntheticSurface {
    let corner = |u: f32, v: f32| {
        [
            base[0] + right[0] * u + up[0] * v,
            base[1] + right[1] * u + up[1] * v,
            base[2] + right[2] * u + up[2] * v,
        ]
    };
    SyntheticSurface {
        id: SurfaceId::from_raw(id),
        stamp: UpdateStamp::from_ticks(stamp),
        positions: vec![corner(0.0, 0.0), corner(1.0, 0.0), corner(1.0, 1.0), corner(0.0, 1.0)],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

fn report(registry: &SurfaceRegistry) {
    let snapshot = registry.snapshot();
    log::info!("registry: {} surfaces, {} dirty", snapshot.len(), registry.dirty_snapshot().len());
    for record in &snapshot {
        log::info!(
            "  surface {} @ tick {}: {} triangles, gpu={}",
            record.id(),
            record.updated_at().ticks(),
            record.mesh().geometry().triangle_count(),
            record.mesh().has_device_resources()
        );
    }
}

#[tokio::main]
async fn main() {
    logging::init();

    let config: IngestConfig = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).expect("config file readable");
            serde_json::from_str(&text).expect("config file parses")
        }
        None => IngestConfig::default(),
    };

    let registry = Arc::new(SurfaceRegistry::new(RegistryConfig {
        render_space: WORLD_SPACE,
        transforms: Arc::new(IdentityTransforms),
    }));

    let gpu = match GpuContext::new().await {
        Ok(context) => {
            registry.attach_device(context.link());
            Some(context)
        }
        Err(err) => {
            log::warn!("running without a GPU device: {err}");
            None
        }
    };

    let source = Arc::new(SyntheticSource::default());
    source.set_surfaces(vec![
        quad(1, 1, [-1.0, 0.0, -1.0], [0.0, 0.0, 2.0], [2.0, 0.0, 0.0]), // floor
        quad(2, 1, [-1.0, 0.0, -1.0], [0.0, 2.0, 0.0], [2.0, 0.0, 0.0]), // wall
    ]);

    let ingestor = SurfaceIngestor::new(
        Arc::clone(&registry),
        Arc::clone(&source) as Arc<dyn PerceptionSource>,
        config,
    )
    .expect("synthetic source grants access");
    let pass = SurfacePass::new(Arc::clone(&registry));

    log::info!("first notification: floor and wall appear");
    ingestor.surfaces_changed().await;
    report(&registry);

    if let Some(gpu) = &gpu {
        pass.update(&gpu.queue);
        log::info!("flushed dirty uploads, {} still dirty", registry.dirty_snapshot().len());
    }

    log::info!("second notification: floor refined, wall leaves the volume");
    source.set_surfaces(vec![quad(
        1, 2, [-2.0, 0.0, -2.0], [0.0, 0.0, 4.0], [4.0, 0.0, 0.0],
    )]);
    ingestor.surfaces_changed().await;
    report(&registry);

    log::info!("suspending: releasing device resources");
    pass.release_device_resources();
    report(&registry);
}
