// src/terrain/noise/noise_utils.rs
use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::noise_parameters::NoiseParameters;

/// Bound for per-octave sample offsets. Larger values start losing precision in f32.
pub const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Largest coordinate handed to Perlin. Beyond it the lattice index no longer fits.
pub const MAX_SAMPLE_COORDINATE: f64 = 1e15;

/// Per-octave sample offsets, two draws per octave from a PRNG seeded by `seed`.
///
/// Octave `o` always receives draws `2o` and `2o + 1` of the sequence, so adding
/// octaves never changes the offsets of the existing ones.
pub fn octave_offsets(seed: i32, octaves: usize, offset: Vec2) -> Vec<Vec2> {
    let mut prng = ChaCha8Rng::seed_from_u64(seed as u32 as u64);
    (0..octaves)
        .map(|_| {
            let x = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32;
            let y = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32;
            Vec2::new(x, y) + offset
        })
        .collect()
}

/// Sum of the absolute amplitudes of every octave. Raw sums never exceed this.
pub fn max_possible_height(params: &NoiseParameters) -> f32 {
    let mut amplitude = 1.0;
    let mut total = 0.0;
    for _ in 0..params.octave_count() {
        total += amplitude;
        amplitude *= params.persistence;
    }
    total
}

/// Layered Perlin sampler for one set of (already clamped) parameters.
pub struct OctaveSampler {
    perlin: Perlin,
    offsets: Vec<Vec2>,
    scale: f32,
    persistence: f32,
    lacunarity: f32,
}

impl OctaveSampler {
    pub fn new(params: &NoiseParameters) -> Self {
        OctaveSampler {
            // The seed acts through the octave offsets; the gradient table stays fixed.
            perlin: Perlin::new(Perlin::DEFAULT_SEED),
            offsets: octave_offsets(params.seed, params.octave_count(), params.offset),
            scale: params.scale,
            persistence: params.persistence,
            lacunarity: params.lacunarity,
        }
    }

    /// Raw (unnormalised) height at grid position `(x, y)`.
    ///
    /// Octaves whose frequency has grown past what Perlin can sample are
    /// skipped, so extreme lacunarity only loses the finest detail.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f32;
        let mut value = 0.0f32;

        for octave_offset in &self.offsets {
            let sample_x = ((x / self.scale) * frequency + octave_offset.x) as f64;
            let sample_y = ((y / self.scale) * frequency + octave_offset.y) as f64;
            if !in_sample_range(sample_x) || !in_sample_range(sample_y) {
                break;
            }

            let perlin_value = self.perlin.get([sample_x, sample_y]) as f32;
            value += perlin_value * amplitude;

            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }

        value
    }
}

fn in_sample_range(coordinate: f64) -> bool {
    coordinate.abs() <= MAX_SAMPLE_COORDINATE
}
