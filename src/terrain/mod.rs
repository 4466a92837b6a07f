pub mod chunk;
pub mod chunk_manager;
pub mod height_curve;
pub mod height_map;
pub mod map_generator;
pub mod mesh_generator;
pub mod noise;
pub mod pipeline;
pub mod region;
pub mod texture;

// Re-export main types for easier access
pub use chunk::{ChunkPosition, ChunkState, TerrainChunk};
pub use chunk_manager::{ChunkManager, StreamingSettings, TickStats};
pub use height_curve::{HeightCurve, Keyframe};
pub use height_map::HeightMap;
pub use map_generator::{DrawMode, MapData, MapDisplay, MapGenerator};
pub use mesh_generator::{MeshPayload, generate_terrain_mesh};
pub use noise::{NoiseParameters, NormalizeMode, generate_noise_map};
pub use pipeline::AsyncPipeline;
pub use region::{Color, RegionTable, TerrainType};
pub use texture::Texture;
