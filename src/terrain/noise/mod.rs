pub mod noise_parameters;
pub mod noise_map;
pub mod noise_utils;

pub use noise_parameters::{NoiseParameters, NormalizeMode};
pub use noise_map::{generate_noise_map, generate_noise_map_at};
