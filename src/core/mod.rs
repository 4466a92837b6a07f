pub mod event_bus;

pub use event_bus::{ChunkEvicted, ChunkMeshReady, ChunkVisibilityChanged, EventBus};
