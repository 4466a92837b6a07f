//! Headless streaming preview - walks a viewer across the terrain and logs what
//! the chunk manager does each tick.
//!
//! Run with:
//! ```
//! cargo run --bin terrain_preview -- [config.toml] [ticks]
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use endless_terrain::config::ConfigurationManager;
use endless_terrain::core::{ChunkMeshReady, EventBus};
use endless_terrain::terrain::ChunkManager;
use glam::Vec2;
use tracing_subscriber::EnvFilter;

const DEFAULT_TICKS: usize = 600;
const VIEWER_SPEED: f32 = 4.0;
const TICK_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let manager = match args.next() {
        Some(path) => ConfigurationManager::load_from_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => {
            tracing::info!("No config given, using reference configuration");
            ConfigurationManager::default()
        }
    };
    let ticks = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid tick count {}", raw))?,
        None => DEFAULT_TICKS,
    };

    let config = manager.validated()?;
    let events = Arc::new(EventBus::new());

    let meshes_ready = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&meshes_ready);
    events.subscribe(move |_: &ChunkMeshReady| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let mut chunks = ChunkManager::from_config(&config, Arc::clone(&events))?;
    let started = Instant::now();
    let mut viewer = Vec2::ZERO;

    for tick in 0..ticks {
        let stats = chunks.update(viewer);
        if stats.created > 0 || stats.evicted > 0 {
            tracing::info!(
                "tick {}: viewer {:?}, +{} chunks, -{} evicted, {} visible, {} ready / {} total",
                tick,
                viewer,
                stats.created,
                stats.evicted,
                stats.visible,
                chunks.ready_count(),
                chunks.chunk_count()
            );
        }
        viewer.x += VIEWER_SPEED;
        std::thread::sleep(TICK_INTERVAL);
    }

    tracing::info!("Preview finished in {:.2?}", started.elapsed());
    tracing::info!("  Chunks: {}", chunks.chunk_count());
    tracing::info!("  Ready: {}", chunks.ready_count());
    tracing::info!("  Meshes delivered: {}", meshes_ready.load(Ordering::Relaxed));

    Ok(())
}
