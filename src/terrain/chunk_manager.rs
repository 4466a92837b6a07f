use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use glam::Vec2;
use lru::LruCache;
use tracing::{debug, info, trace, warn};

use crate::config::TerrainConfiguration;
use crate::core::event_bus::{ChunkEvicted, ChunkMeshReady, ChunkVisibilityChanged, EventBus};
use crate::error::Result;
use crate::terrain::chunk::{ChunkPosition, TerrainChunk};
use crate::terrain::map_generator::{MapData, MapGenerator};
use crate::terrain::mesh_generator::MeshPayload;
use crate::terrain::pipeline::{AsyncPipeline, DrainStats};
use crate::threading::ThreadPool;

/// Upper bound on the neighbourhood radius, in chunks.
pub const MAX_CHUNKS_VISIBLE_IN_VIEW_DISTANCE: i32 = 512;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamingSettings {
    pub max_view_distance: f32,
    // None keeps every chunk ever created.
    pub max_retained_chunks: Option<usize>,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        StreamingSettings {
            max_view_distance: 300.0,
            max_retained_chunks: None,
        }
    }
}

/// What one [`ChunkManager::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub created: usize,
    pub visible: usize,
    pub evicted: usize,
    pub drained: DrainStats,
}

/// Chunk records and the event bus: the state completion callbacks work on.
pub struct ChunkRegistry {
    chunks: HashMap<ChunkPosition, TerrainChunk>,
    events: Arc<EventBus>,
}

impl ChunkRegistry {
    fn new(events: Arc<EventBus>) -> Self {
        ChunkRegistry {
            chunks: HashMap::new(),
            events,
        }
    }

    // Chunk matching both position and request, or None for a stale delivery.
    fn current(&mut self, position: ChunkPosition, request_id: u64) -> Option<&mut TerrainChunk> {
        self.chunks
            .get_mut(&position)
            .filter(|chunk| chunk.request_id() == request_id)
    }

    fn on_map_data_received(
        &mut self,
        position: ChunkPosition,
        request_id: u64,
        map_data: MapData,
        pipeline: &AsyncPipeline<ChunkRegistry>,
    ) {
        let Some(chunk) = self.current(position, request_id) else {
            debug!("Dropping map data for retired chunk {:?}", position);
            return;
        };

        let handle = pipeline.request_mesh_data(map_data, move |registry, _, mesh| {
            registry.on_mesh_data_received(position, request_id, mesh);
        });
        chunk.awaiting_mesh(handle);
    }

    fn on_mesh_data_received(&mut self, position: ChunkPosition, request_id: u64, mesh: MeshPayload) {
        let Some(chunk) = self.current(position, request_id) else {
            debug!("Dropping mesh for retired chunk {:?}", position);
            return;
        };

        let mesh = Arc::new(mesh);
        chunk.attach_mesh(Arc::clone(&mesh));
        let visible = chunk.is_visible();
        trace!("Chunk {:?} ready ({} vertices)", position, mesh.vertex_count());

        self.events.publish(ChunkMeshReady {
            position,
            mesh,
            visible,
        });
    }
}

/// Streams terrain chunks around a moving viewer.
///
/// Chunks inside the square neighbourhood of the viewer's chunk are created on
/// first sight and generated in the background; every tick each of them is
/// shown or hidden by its distance to the viewer. Chunk records are kept for
/// the lifetime of the manager unless `max_retained_chunks` is set.
pub struct ChunkManager {
    pipeline: AsyncPipeline<ChunkRegistry>,
    registry: ChunkRegistry,
    chunk_size: f32,
    max_view_distance: f32,
    chunks_visible_in_view_distance: i32,
    terrain_chunks_visible_last_update: Vec<ChunkPosition>,
    retention: Option<LruCache<ChunkPosition, ()>>,
    next_request_id: u64,
}

impl ChunkManager {
    pub fn new(
        generator: Arc<MapGenerator>,
        pool: Arc<ThreadPool>,
        events: Arc<EventBus>,
        settings: StreamingSettings,
    ) -> Self {
        let chunk_size = generator.chunk_size().max(1) as f32;
        let max_view_distance = settings.max_view_distance.max(0.0);
        let radius = (max_view_distance / chunk_size).round();
        let chunks_visible_in_view_distance = if radius > MAX_CHUNKS_VISIBLE_IN_VIEW_DISTANCE as f32 {
            warn!(
                "View distance {} spans {} chunks per direction, capping at {}",
                max_view_distance, radius, MAX_CHUNKS_VISIBLE_IN_VIEW_DISTANCE
            );
            MAX_CHUNKS_VISIBLE_IN_VIEW_DISTANCE
        } else {
            radius as i32
        };

        let side = (2 * chunks_visible_in_view_distance + 1) as usize;
        let neighbourhood = side * side;
        let retention = settings.max_retained_chunks.map(|requested| {
            let capacity = if requested < neighbourhood {
                warn!(
                    "max_retained_chunks {} is below the view neighbourhood of {} chunks, using {}",
                    requested, neighbourhood, neighbourhood
                );
                neighbourhood
            } else {
                requested
            };
            LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
        });

        info!(
            "Chunk manager: chunk size {}, view distance {}, {} chunks visible per direction",
            chunk_size, max_view_distance, chunks_visible_in_view_distance
        );

        ChunkManager {
            pipeline: AsyncPipeline::new(pool, generator),
            registry: ChunkRegistry::new(events),
            chunk_size,
            max_view_distance,
            chunks_visible_in_view_distance,
            terrain_chunks_visible_last_update: Vec::new(),
            retention,
            next_request_id: 0,
        }
    }

    /// Builds the worker pool and generator from a validated configuration.
    pub fn from_config(config: &TerrainConfiguration, events: Arc<EventBus>) -> Result<Self> {
        let pool = Arc::new(ThreadPool::new(config.workers.max_threads)?);
        Ok(Self::new(
            Arc::new(config.map_generator()),
            pool,
            events,
            config.streaming_settings(),
        ))
    }

    /// One tick: refresh visibility around `viewer`, then deliver finished work.
    pub fn update(&mut self, viewer: Vec2) -> TickStats {
        let mut stats = self.update_visible_chunks(viewer);
        stats.drained = self.process_completions();
        stats
    }

    /// Hides last tick's chunks, then re-evaluates every chunk in the square
    /// neighbourhood of the viewer, creating the ones never seen before.
    pub fn update_visible_chunks(&mut self, viewer: Vec2) -> TickStats {
        let mut stats = TickStats::default();

        let previously_visible: HashSet<ChunkPosition> =
            self.terrain_chunks_visible_last_update.drain(..).collect();
        for position in &previously_visible {
            if let Some(chunk) = self.registry.chunks.get_mut(position) {
                chunk.set_visible(false);
            }
        }

        let current = ChunkPosition::from_world(viewer, self.chunk_size);
        let range = self.chunks_visible_in_view_distance;
        let mut created = Vec::new();

        for z_offset in -range..=range {
            for x_offset in -range..=range {
                let viewed_chunk_coord = current.offset(x_offset, z_offset);

                if let Some(chunk) = self.registry.chunks.get_mut(&viewed_chunk_coord) {
                    chunk.update_visibility(viewer, self.max_view_distance);
                    if chunk.is_visible() {
                        self.terrain_chunks_visible_last_update.push(viewed_chunk_coord);
                    }
                    if let Some(retention) = &mut self.retention {
                        retention.promote(&viewed_chunk_coord);
                    }
                } else {
                    self.create_chunk(viewed_chunk_coord);
                    created.push(viewed_chunk_coord);
                }
            }
        }

        // Only net changes reach subscribers.
        let now_visible: HashSet<ChunkPosition> =
            self.terrain_chunks_visible_last_update.iter().copied().collect();
        for position in &previously_visible {
            if !now_visible.contains(position) {
                self.registry.events.publish(ChunkVisibilityChanged {
                    position: *position,
                    visible: false,
                });
            }
        }
        for position in &self.terrain_chunks_visible_last_update {
            if !previously_visible.contains(position) {
                self.registry.events.publish(ChunkVisibilityChanged {
                    position: *position,
                    visible: true,
                });
            }
        }

        // Every in-range chunk was promoted above, so only out-of-range ones can fall out.
        for position in &created {
            let evicted = match &mut self.retention {
                Some(retention) => retention.push(*position, ()),
                None => None,
            };
            if let Some((evicted, _)) = evicted {
                if evicted != *position {
                    self.evict(evicted);
                    stats.evicted += 1;
                }
            }
        }

        stats.created = created.len();
        stats.visible = self.terrain_chunks_visible_last_update.len();
        if stats.created > 0 {
            debug!(
                "Viewer at {:?} (chunk {:?}): created {} chunks, {} visible, {} total",
                viewer,
                current,
                stats.created,
                stats.visible,
                self.registry.chunks.len()
            );
        }
        stats
    }

    /// Runs every completion callback queued since the last call.
    pub fn process_completions(&mut self) -> DrainStats {
        self.pipeline.drain(&mut self.registry)
    }

    fn create_chunk(&mut self, position: ChunkPosition) {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let mut chunk = TerrainChunk::new(position, self.chunk_size, request_id);
        let handle = self
            .pipeline
            .request_map_data(chunk.bounds.centre, move |registry, pipeline, map_data| {
                registry.on_map_data_received(position, request_id, map_data, pipeline);
            });
        chunk.awaiting_height_map(handle);

        trace!("Created chunk {:?} (request {})", position, request_id);
        self.registry.chunks.insert(position, chunk);
    }

    fn evict(&mut self, position: ChunkPosition) {
        if let Some(mut chunk) = self.registry.chunks.remove(&position) {
            chunk.cancel_pending();
            debug!("Evicted chunk {:?}", position);
            self.registry.events.publish(ChunkEvicted { position });
        }
    }

    pub fn chunk(&self, position: ChunkPosition) -> Option<&TerrainChunk> {
        self.registry.chunks.get(&position)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.registry.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.registry.chunks.len()
    }

    pub fn ready_count(&self) -> usize {
        self.chunks().filter(|chunk| chunk.is_ready()).count()
    }

    /// Chunks made visible by the last tick.
    pub fn visible_chunks(&self) -> &[ChunkPosition] {
        &self.terrain_chunks_visible_last_update
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    pub fn max_view_distance(&self) -> f32 {
        self.max_view_distance
    }

    pub fn chunks_visible_in_view_distance(&self) -> i32 {
        self.chunks_visible_in_view_distance
    }

    /// No work running on the pool and nothing waiting to be drained.
    pub fn is_idle(&self) -> bool {
        self.pipeline.is_idle()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.registry.events
    }
}
