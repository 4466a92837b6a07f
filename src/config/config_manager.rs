// src/config/config_manager.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TerrainError};
use crate::terrain::chunk_manager::StreamingSettings;
use crate::terrain::height_curve::HeightCurve;
use crate::terrain::map_generator::{DrawMode, MAP_CHUNK_SIZE, MapGenerator};
use crate::terrain::mesh_generator::MAX_LEVEL_OF_DETAIL;
use crate::terrain::noise::NoiseParameters;
use crate::terrain::region::RegionTable;
use crate::threading::thread_pool::default_worker_count;

// Default values
pub fn default_max_view_distance() -> f32 {
    300.0
}

// --- Struct Definitions ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MeshConfigData {
    pub height_multiplier: f32,
    pub level_of_detail: i32,
    pub height_curve: HeightCurve,
}

impl Default for MeshConfigData {
    fn default() -> Self {
        MeshConfigData {
            height_multiplier: 10.0,
            level_of_detail: 0,
            height_curve: HeightCurve::linear(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StreamingConfigData {
    pub map_chunk_size: usize,
    pub max_view_distance: f32,
    // Unset keeps every chunk for the lifetime of the process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retained_chunks: Option<usize>,
}

impl Default for StreamingConfigData {
    fn default() -> Self {
        StreamingConfigData {
            map_chunk_size: MAP_CHUNK_SIZE,
            max_view_distance: default_max_view_distance(),
            max_retained_chunks: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WorkerConfigData {
    // 0 picks all CPUs minus one
    pub max_threads: usize,
}

impl Default for WorkerConfigData {
    fn default() -> Self {
        WorkerConfigData {
            max_threads: default_worker_count(),
        }
    }
}

// --- Main configuration struct ---
// Plain values first: TOML needs them ahead of any table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TerrainConfiguration {
    pub draw_mode: DrawMode,
    pub noise: NoiseParameters,
    pub mesh: MeshConfigData,
    pub streaming: StreamingConfigData,
    pub workers: WorkerConfigData,
    pub regions: RegionTable,
}

impl Default for TerrainConfiguration {
    fn default() -> Self {
        TerrainConfiguration {
            draw_mode: DrawMode::default(),
            noise: NoiseParameters::default(),
            mesh: MeshConfigData::default(),
            streaming: StreamingConfigData::default(),
            workers: WorkerConfigData::default(),
            regions: RegionTable::reference(),
        }
    }
}

impl TerrainConfiguration {
    /// Returns a copy with range errors clamped (and logged), or an error for
    /// problems that cannot be corrected, like a malformed region table.
    pub fn validated(&self) -> Result<TerrainConfiguration> {
        let mut config = self.clone();

        config.noise = self.noise.validated();

        let lod = self.mesh.level_of_detail.clamp(0, MAX_LEVEL_OF_DETAIL as i32);
        if lod != self.mesh.level_of_detail {
            warn!(
                "Level of detail {} is outside 0..={}, using {}",
                self.mesh.level_of_detail, MAX_LEVEL_OF_DETAIL, lod
            );
            config.mesh.level_of_detail = lod;
        }
        config.mesh.height_curve = HeightCurve::new(self.mesh.height_curve.keys().to_vec());

        if !self.mesh.height_multiplier.is_finite() {
            return Err(TerrainError::InvalidConfig(format!(
                "mesh height multiplier {} is not finite",
                self.mesh.height_multiplier
            )));
        }

        if self.streaming.map_chunk_size < 2 {
            warn!(
                "Map chunk size {} is too small, using 2",
                self.streaming.map_chunk_size
            );
            config.streaming.map_chunk_size = 2;
        }

        if self.streaming.max_view_distance.is_nan() {
            return Err(TerrainError::InvalidConfig("max view distance is NaN".to_string()));
        }
        if self.streaming.max_view_distance < 0.0 {
            warn!(
                "Max view distance {} is negative, using 0",
                self.streaming.max_view_distance
            );
            config.streaming.max_view_distance = 0.0;
        }

        if config.workers.max_threads == 0 {
            config.workers.max_threads = default_worker_count();
        }

        self.regions.validate()?;

        Ok(config)
    }

    /// Generator settings shared with the worker pool.
    pub fn map_generator(&self) -> MapGenerator {
        MapGenerator {
            map_chunk_size: self.streaming.map_chunk_size,
            noise: self.noise.clone(),
            level_of_detail: self.mesh.level_of_detail.clamp(0, MAX_LEVEL_OF_DETAIL as i32) as u32,
            mesh_height_multiplier: self.mesh.height_multiplier,
            mesh_height_curve: self.mesh.height_curve.clone(),
            regions: self.regions.clone(),
            draw_mode: self.draw_mode,
        }
    }

    pub fn streaming_settings(&self) -> StreamingSettings {
        StreamingSettings {
            max_view_distance: self.streaming.max_view_distance,
            max_retained_chunks: self.streaming.max_retained_chunks,
        }
    }
}

// Configuration Manager: owns the current configuration and where it came from.
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    current_config: TerrainConfiguration,
    config_path: Option<PathBuf>,
}

impl ConfigurationManager {
    pub fn with_config(config: TerrainConfiguration, config_path: Option<PathBuf>) -> Self {
        Self {
            current_config: config,
            config_path,
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: TerrainConfiguration = toml::from_str(source)?;
        Ok(Self::with_config(config, None))
    }

    // Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Loading terrain config from: {:?}", path_ref);
        let config_str = fs::read_to_string(path_ref)?;
        let mut manager = Self::from_toml_str(&config_str)?;
        manager.config_path = Some(path_ref.to_path_buf());
        Ok(manager)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.current_config)?)
    }

    // Save configuration to the path it was loaded from (or set later)
    pub fn save_to_file(&self) -> Result<()> {
        match &self.config_path {
            Some(path) => {
                info!("Saving terrain config to: {:?}", path);
                fs::write(path, self.to_toml_string()?)?;
                Ok(())
            }
            None => {
                warn!("Cannot save configuration: No config path set.");
                Ok(())
            }
        }
    }

    pub fn set_config_path<P: AsRef<Path>>(&mut self, path: P) {
        self.config_path = Some(path.as_ref().to_path_buf());
    }

    pub fn update_config(&mut self, updates: TerrainConfiguration) {
        self.current_config = updates;
    }

    pub fn get_config(&self) -> &TerrainConfiguration {
        &self.current_config
    }

    pub fn get_config_mut(&mut self) -> &mut TerrainConfiguration {
        &mut self.current_config
    }

    pub fn validated(&self) -> Result<TerrainConfiguration> {
        self.current_config.validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::noise::NormalizeMode;

    const SAMPLE: &str = r#"
draw_mode = "mesh"

[noise]
scale = 0.0
octaves = -1
persistence = 0.5
lacunarity = 0.5
seed = 7
offset = [1.5, -2.0]
normalize_mode = "global"

[mesh]
height_multiplier = 30.0
level_of_detail = 9
height_curve = [
    { time = 1.0, value = 1.0 },
    { time = 0.0, value = 0.0 },
]

[streaming]
map_chunk_size = 121
max_view_distance = 450.0
max_retained_chunks = 64

[workers]
max_threads = 2

[[regions]]
name = "water"
height = 0.4
color = { r = 0.0, g = 0.0, b = 1.0 }

[[regions]]
name = "land"
height = 1.0
color = { r = 0.0, g = 1.0, b = 0.0 }
"#;

    #[test]
    fn parses_and_clamps_sample() {
        let manager = ConfigurationManager::from_toml_str(SAMPLE).unwrap();
        let config = manager.validated().unwrap();

        assert_eq!(config.draw_mode, DrawMode::Mesh);
        assert_eq!(config.noise.scale, crate::terrain::noise::noise_parameters::MIN_NOISE_SCALE);
        assert_eq!(config.noise.octaves, 0);
        assert_eq!(config.noise.lacunarity, 1.0);
        assert_eq!(config.noise.normalize_mode, NormalizeMode::Global);
        assert_eq!(config.noise.offset, glam::Vec2::new(1.5, -2.0));
        assert_eq!(config.mesh.level_of_detail, 6);
        assert_eq!(config.mesh.height_curve.keys()[0].time, 0.0);
        assert_eq!(config.streaming.max_retained_chunks, Some(64));
        assert_eq!(config.workers.max_threads, 2);
        assert_eq!(config.regions.regions().len(), 2);
        assert_eq!(config.regions.regions()[0].color.a, 1.0);

        let generator = config.map_generator();
        assert_eq!(generator.chunk_size(), 120);
        assert_eq!(generator.level_of_detail, 6);
    }

    #[test]
    fn empty_document_uses_reference_defaults() {
        let config = ConfigurationManager::from_toml_str("").unwrap().validated().unwrap();
        assert_eq!(config.streaming.map_chunk_size, MAP_CHUNK_SIZE);
        assert_eq!(config.streaming.max_view_distance, 300.0);
        assert_eq!(config.streaming.max_retained_chunks, None);
        assert_eq!(config.regions, RegionTable::reference());
    }

    #[test]
    fn malformed_region_table_is_rejected() {
        let source = r#"
[[regions]]
height = 0.5
color = { r = 0.0, g = 0.0, b = 1.0 }
"#;
        let result = ConfigurationManager::from_toml_str(source).unwrap().validated();
        assert!(matches!(result, Err(TerrainError::InvalidRegionTable(_))));
    }

    #[test]
    fn syntax_errors_surface_as_parse_errors() {
        let result = ConfigurationManager::from_toml_str("[noise\nscale = ");
        assert!(matches!(result, Err(TerrainError::ConfigParse(_))));
    }

    #[test]
    fn round_trips_through_file() {
        let dir = std::env::temp_dir().join(format!("endless_terrain_cfg_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("terrain.toml");

        let mut manager = ConfigurationManager::from_toml_str(SAMPLE).unwrap();
        manager.set_config_path(&path);
        manager.save_to_file().unwrap();

        let loaded = ConfigurationManager::load_from_file(&path).unwrap();
        assert_eq!(loaded.get_config(), manager.get_config());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ConfigurationManager::load_from_file("/definitely/not/here/terrain.toml");
        assert!(matches!(result, Err(TerrainError::Io(_))));
    }
}
