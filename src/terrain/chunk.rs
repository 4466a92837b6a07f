use std::sync::Arc;

use glam::Vec2;

use crate::terrain::mesh_generator::MeshPayload;
use crate::threading::TaskHandle;

// Unique identifier for a chunk based on its position on the chunk grid.
// `x` runs along world x, `z` along world z (the viewer's second coordinate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPosition {
    pub x: i32,
    pub z: i32,
}

impl ChunkPosition {
    pub fn new(x: i32, z: i32) -> Self {
        ChunkPosition { x, z }
    }

    /// Chunk containing `viewer`, rounding to the nearest chunk centre.
    /// A viewer exactly on a chunk border goes to the even coordinate.
    pub fn from_world(viewer: Vec2, chunk_size: f32) -> Self {
        ChunkPosition {
            x: (viewer.x / chunk_size).round_ties_even() as i32,
            z: (viewer.y / chunk_size).round_ties_even() as i32,
        }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        ChunkPosition {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    pub fn world_centre(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.z as f32) * chunk_size
    }
}

/// Axis-aligned square on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub centre: Vec2,
    pub half_extent: f32,
}

impl Bounds {
    pub fn new(centre: Vec2, size: f32) -> Self {
        Bounds {
            centre,
            half_extent: size / 2.0,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.centre - Vec2::splat(self.half_extent)
    }

    pub fn max(&self) -> Vec2 {
        self.centre + Vec2::splat(self.half_extent)
    }

    /// Squared distance from `point` to the nearest point of the square; 0 inside.
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        let nearest = point.clamp(self.min(), self.max());
        point.distance_squared(nearest)
    }

    pub fn distance(&self, point: Vec2) -> f32 {
        self.sqr_distance(point).sqrt()
    }
}

// Generation progress. Visibility is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Created,
    AwaitingHeightMap,
    AwaitingMesh,
    Ready,
}

pub struct TerrainChunk {
    pub position: ChunkPosition,
    pub bounds: Bounds,
    state: ChunkState,
    visible: bool,
    mesh: Option<Arc<MeshPayload>>,
    // Identifies the request chain that may still deliver to this record.
    request_id: u64,
    pending: Option<TaskHandle>,
}

impl TerrainChunk {
    pub fn new(position: ChunkPosition, chunk_size: f32, request_id: u64) -> Self {
        TerrainChunk {
            position,
            bounds: Bounds::new(position.world_centre(chunk_size), chunk_size),
            state: ChunkState::Created,
            visible: false,
            mesh: None,
            request_id,
            pending: None,
        }
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_ready(&self) -> bool {
        self.state == ChunkState::Ready
    }

    pub fn mesh(&self) -> Option<&Arc<MeshPayload>> {
        self.mesh.as_ref()
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Sets the flag and reports whether it changed.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        let changed = self.visible != visible;
        self.visible = visible;
        changed
    }

    /// Recomputes visibility from the viewer's distance to the bounds.
    /// Returns whether the flag changed.
    pub fn update_visibility(&mut self, viewer: Vec2, max_view_distance: f32) -> bool {
        let viewer_distance_from_nearest_edge = self.bounds.distance(viewer);
        self.set_visible(viewer_distance_from_nearest_edge <= max_view_distance)
    }

    pub(crate) fn awaiting_height_map(&mut self, handle: TaskHandle) {
        self.state = ChunkState::AwaitingHeightMap;
        self.pending = Some(handle);
    }

    pub(crate) fn awaiting_mesh(&mut self, handle: TaskHandle) {
        self.state = ChunkState::AwaitingMesh;
        self.pending = Some(handle);
    }

    pub(crate) fn attach_mesh(&mut self, mesh: Arc<MeshPayload>) {
        self.state = ChunkState::Ready;
        self.mesh = Some(mesh);
        self.pending = None;
    }

    /// Cancels whatever request is still running for this chunk.
    pub(crate) fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
    }
}
