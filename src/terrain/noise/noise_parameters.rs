// src/terrain/noise/noise_parameters.rs
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Smallest usable noise scale. Anything at or below zero is raised to this.
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// How raw octave sums are mapped into [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Remap from the observed min/max of this map. Every map spans the full range.
    #[default]
    Local,
    /// Remap from the theoretical amplitude bound, shared by every map, so
    /// neighbouring chunks agree on absolute heights.
    Global,
}

// --- Main Parameter Struct ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParameters {
    pub scale: f32,
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub seed: i32,
    pub offset: Vec2,
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        NoiseParameters {
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 1,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Local,
        }
    }
}

impl NoiseParameters {
    /// Returns a copy with every out-of-range value moved to the nearest valid one.
    pub fn clamped(&self) -> NoiseParameters {
        let mut params = self.clone();

        if !(params.scale > 0.0) {
            params.scale = MIN_NOISE_SCALE;
        }
        if params.octaves < 0 {
            params.octaves = 0;
        }
        if !(params.lacunarity >= 1.0) {
            params.lacunarity = 1.0;
        }
        params.persistence = if params.persistence.is_nan() {
            0.0
        } else {
            params.persistence.clamp(0.0, 1.0)
        };

        params
    }

    /// Same as [`clamped`](Self::clamped) but reports every correction.
    pub fn validated(&self) -> NoiseParameters {
        let params = self.clamped();
        if params.scale != self.scale {
            warn!("Noise scale {} is not positive, using {}", self.scale, params.scale);
        }
        if params.octaves != self.octaves {
            warn!("Octave count {} is negative, using 0", self.octaves);
        }
        if params.lacunarity != self.lacunarity {
            warn!("Lacunarity {} is below 1, using 1", self.lacunarity);
        }
        if params.persistence != self.persistence {
            warn!(
                "Persistence {} is outside [0, 1], using {}",
                self.persistence, params.persistence
            );
        }
        params
    }

    pub fn octave_count(&self) -> usize {
        self.octaves.max(0) as usize
    }
}
