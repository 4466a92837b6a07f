// src/terrain/noise/noise_map.rs
use glam::Vec2;

use super::noise_parameters::{NoiseParameters, NormalizeMode};
use super::noise_utils::{OctaveSampler, max_possible_height};
use crate::terrain::height_map::HeightMap;

// Ranges narrower than this are treated as flat.
const DEGENERATE_RANGE: f32 = 1e-6;

/// Fractal noise map sampled at grid positions `(0..width, 0..height)`.
///
/// Out-of-range parameters are clamped first. The result always lies in [0, 1];
/// a flat field (including `octaves == 0`) comes back as all zeros.
pub fn generate_noise_map(width: usize, height: usize, params: &NoiseParameters) -> HeightMap {
    generate_noise_map_at(width, height, params, Vec2::ZERO)
}

/// Same as [`generate_noise_map`] with every grid position shifted by `origin`
/// before sampling. Maps generated at origins that differ by a whole number of
/// cells share their overlapping raw samples.
pub fn generate_noise_map_at(
    width: usize,
    height: usize,
    params: &NoiseParameters,
    origin: Vec2,
) -> HeightMap {
    let params = params.clamped();
    let sampler = OctaveSampler::new(&params);
    let mut noise_map = HeightMap::new(width, height);

    let mut min_noise_height = f32::MAX;
    let mut max_noise_height = f32::MIN;

    for y in 0..height {
        for x in 0..width {
            let value = sampler.sample(x as f32 + origin.x, y as f32 + origin.y);
            min_noise_height = min_noise_height.min(value);
            max_noise_height = max_noise_height.max(value);
            noise_map.set(x, y, value);
        }
    }

    match params.normalize_mode {
        NormalizeMode::Local => {
            let range = max_noise_height - min_noise_height;
            if !(range > DEGENERATE_RANGE) {
                noise_map.values_mut().fill(0.0);
            } else {
                for value in noise_map.values_mut() {
                    *value = ((*value - min_noise_height) / range).clamp(0.0, 1.0);
                }
            }
        }
        NormalizeMode::Global => {
            let bound = max_possible_height(&params);
            if !(bound > DEGENERATE_RANGE) {
                noise_map.values_mut().fill(0.0);
            } else {
                for value in noise_map.values_mut() {
                    *value = ((*value / bound + 1.0) / 2.0).clamp(0.0, 1.0);
                }
            }
        }
    }

    noise_map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_params(seed: i32) -> NoiseParameters {
        NoiseParameters {
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Local,
        }
    }

    #[test]
    fn same_inputs_give_identical_maps() {
        let a = generate_noise_map(241, 241, &reference_params(1));
        let b = generate_noise_map(241, 241, &reference_params(1));
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_changes_at_least_one_cell() {
        let a = generate_noise_map(241, 241, &reference_params(1));
        let b = generate_noise_map(241, 241, &reference_params(2));
        assert!(a.values().iter().zip(b.values()).any(|(x, y)| x != y));
    }

    #[test]
    fn values_are_normalized_for_many_parameter_sets() {
        for octaves in [0, 1, 3, 8] {
            for persistence in [0.0, 0.3, 1.0] {
                for lacunarity in [1.0, 2.0, 3.5] {
                    for mode in [NormalizeMode::Local, NormalizeMode::Global] {
                        let params = NoiseParameters {
                            scale: 27.6,
                            octaves,
                            persistence,
                            lacunarity,
                            seed: 99,
                            offset: Vec2::new(3.0, -8.0),
                            normalize_mode: mode,
                        };
                        let map = generate_noise_map(33, 17, &params);
                        assert!(
                            map.values().iter().all(|v| (0.0..=1.0).contains(v)),
                            "out of range for {:?}",
                            params
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn extreme_lacunarity_stays_normalized() {
        for mode in [NormalizeMode::Local, NormalizeMode::Global] {
            let params = NoiseParameters {
                lacunarity: 1e10,
                octaves: 5,
                normalize_mode: mode,
                ..reference_params(1)
            };
            let map = generate_noise_map(8, 8, &params);
            assert!(
                map.values().iter().all(|v| (0.0..=1.0).contains(v)),
                "out of range for {:?}",
                mode
            );
        }
    }

    #[test]
    fn local_mode_spans_full_range() {
        let map = generate_noise_map(64, 64, &reference_params(5));
        let (lo, hi) = map.min_max().unwrap();
        assert_eq!(lo, 0.0);
        assert!((hi - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_octaves_yield_all_zero_field() {
        let params = NoiseParameters { octaves: 0, ..reference_params(1) };
        let map = generate_noise_map(16, 16, &params);
        assert!(map.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn non_positive_scale_still_generates() {
        let params = NoiseParameters { scale: 0.0, ..reference_params(1) };
        let map = generate_noise_map(8, 8, &params);
        assert!(map.values().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    }

    #[test]
    fn shifted_global_maps_share_overlapping_cells() {
        let params = NoiseParameters {
            normalize_mode: NormalizeMode::Global,
            ..reference_params(3)
        };
        let left = generate_noise_map_at(11, 11, &params, Vec2::ZERO);
        let right = generate_noise_map_at(11, 11, &params, Vec2::new(10.0, 0.0));
        for y in 0..11 {
            assert_eq!(left.get(10, y), right.get(0, y));
        }
    }
}
