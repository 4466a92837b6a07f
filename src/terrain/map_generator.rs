use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::terrain::height_curve::HeightCurve;
use crate::terrain::height_map::HeightMap;
use crate::terrain::mesh_generator::{MeshPayload, generate_terrain_mesh};
use crate::terrain::noise::{NoiseParameters, generate_noise_map_at};
use crate::terrain::region::{Color, RegionTable};
use crate::terrain::texture::Texture;

/// Samples per side of one chunk's map. 241 - 1 = 240 divides by every LOD stride.
pub const MAP_CHUNK_SIZE: usize = 241;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    NoiseMap,
    #[default]
    ColorMap,
    Mesh,
}

/// Display surface for previews. Implemented outside the crate.
pub trait MapDisplay {
    fn draw_texture(&mut self, texture: Texture);
    fn draw_mesh(&mut self, mesh: MeshPayload, texture: Texture);
}

/// Height map plus its per-cell region colours.
#[derive(Debug, Clone, PartialEq)]
pub struct MapData {
    pub height_map: HeightMap,
    pub color_map: Vec<Color>,
}

/// Everything needed to turn a map position into height, colour and mesh data.
///
/// Read-only once built; shared with workers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MapGenerator {
    pub map_chunk_size: usize,
    pub noise: NoiseParameters,
    pub level_of_detail: u32,
    pub mesh_height_multiplier: f32,
    pub mesh_height_curve: HeightCurve,
    pub regions: RegionTable,
    pub draw_mode: DrawMode,
}

impl Default for MapGenerator {
    fn default() -> Self {
        MapGenerator {
            map_chunk_size: MAP_CHUNK_SIZE,
            noise: NoiseParameters::default(),
            level_of_detail: 0,
            mesh_height_multiplier: 10.0,
            mesh_height_curve: HeightCurve::linear(),
            regions: RegionTable::reference(),
            draw_mode: DrawMode::default(),
        }
    }
}

impl MapGenerator {
    /// World distance covered by one chunk.
    pub fn chunk_size(&self) -> usize {
        self.map_chunk_size.saturating_sub(1)
    }

    /// Map whose centre sample sits at world `(centre.x, centre.y)`.
    ///
    /// Grid rows run towards -y in world space, matching the mesh layout, so maps
    /// for adjacent chunks agree along their shared edge.
    pub fn generate_map_data(&self, centre: Vec2) -> MapData {
        let size = self.map_chunk_size;
        let half = (size as f32 - 1.0) / 2.0;
        let origin = Vec2::new(centre.x - half, -centre.y - half);

        let height_map = generate_noise_map_at(size, size, &self.noise, origin);
        let color_map = self.color_map(&height_map);

        debug!("Generated {}x{} map data at {:?}", size, size, centre);
        MapData { height_map, color_map }
    }

    pub fn color_map(&self, height_map: &HeightMap) -> Vec<Color> {
        height_map
            .values()
            .iter()
            .map(|&h| self.regions.classify(h).unwrap_or_default())
            .collect()
    }

    pub fn generate_mesh(&self, map_data: &MapData) -> MeshPayload {
        generate_terrain_mesh(
            &map_data.height_map,
            self.mesh_height_multiplier,
            &self.mesh_height_curve,
            self.level_of_detail,
        )
    }

    /// Renders the map at the origin to `display` according to `draw_mode`.
    pub fn draw_map(&self, display: &mut dyn MapDisplay) {
        let map_data = self.generate_map_data(Vec2::ZERO);
        let size = self.map_chunk_size;

        match self.draw_mode {
            DrawMode::NoiseMap => display.draw_texture(Texture::from_height_map(&map_data.height_map)),
            DrawMode::ColorMap => {
                display.draw_texture(Texture::from_color_map(&map_data.color_map, size, size))
            }
            DrawMode::Mesh => {
                let mesh = self.generate_mesh(&map_data);
                display.draw_mesh(mesh, Texture::from_color_map(&map_data.color_map, size, size));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingDisplay {
        textures: Vec<Texture>,
        meshes: Vec<MeshPayload>,
    }

    impl MapDisplay for RecordingDisplay {
        fn draw_texture(&mut self, texture: Texture) {
            self.textures.push(texture);
        }

        fn draw_mesh(&mut self, mesh: MeshPayload, texture: Texture) {
            self.meshes.push(mesh);
            self.textures.push(texture);
        }
    }

    fn small_generator(draw_mode: DrawMode) -> MapGenerator {
        MapGenerator {
            map_chunk_size: 25,
            draw_mode,
            ..Default::default()
        }
    }

    #[test]
    fn color_map_matches_region_lookup() {
        let generator = small_generator(DrawMode::ColorMap);
        let data = generator.generate_map_data(Vec2::ZERO);
        assert_eq!(data.color_map.len(), 25 * 25);
        for (h, c) in data.height_map.values().iter().zip(&data.color_map) {
            assert_eq!(Some(*c), generator.regions.classify(*h));
        }
    }

    #[test]
    fn draw_modes_reach_the_display() {
        let mut display = RecordingDisplay::default();
        small_generator(DrawMode::NoiseMap).draw_map(&mut display);
        small_generator(DrawMode::ColorMap).draw_map(&mut display);
        small_generator(DrawMode::Mesh).draw_map(&mut display);

        assert_eq!(display.textures.len(), 3);
        assert_eq!(display.meshes.len(), 1);
        assert_eq!(display.meshes[0].vertex_count(), 25 * 25);
        // Noise map preview is grayscale.
        assert!(display.textures[0].pixels.iter().all(|p| p.r == p.g && p.g == p.b));
    }

    #[test]
    fn neighbouring_chunks_share_raw_samples_along_edge() {
        let mut generator = small_generator(DrawMode::Mesh);
        generator.noise.normalize_mode = crate::terrain::noise::NormalizeMode::Global;
        let chunk = generator.chunk_size() as f32;

        let left = generator.generate_map_data(Vec2::ZERO);
        let right = generator.generate_map_data(Vec2::new(chunk, 0.0));
        let last = generator.map_chunk_size - 1;
        for y in 0..generator.map_chunk_size {
            assert_eq!(left.height_map.get(last, y), right.height_map.get(0, y));
        }
    }
}
