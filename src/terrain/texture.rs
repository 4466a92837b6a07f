use crate::terrain::height_map::HeightMap;
use crate::terrain::region::Color;

/// CPU-side pixel buffer handed to a display surface. Row-major, like [`HeightMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
}

impl Texture {
    pub fn from_color_map(color_map: &[Color], width: usize, height: usize) -> Texture {
        debug_assert_eq!(color_map.len(), width * height);
        Texture {
            width,
            height,
            pixels: color_map.to_vec(),
        }
    }

    /// Grayscale rendering: 0 is black, 1 is white.
    pub fn from_height_map(height_map: &HeightMap) -> Texture {
        let pixels = height_map
            .values()
            .iter()
            .map(|&h| Color::BLACK.lerp(Color::WHITE, h))
            .collect();
        Texture {
            width: height_map.width(),
            height: height_map.height(),
            pixels,
        }
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_rgba8()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_map_becomes_grayscale() {
        let map = HeightMap::from_values(2, 1, vec![0.0, 1.0]).unwrap();
        let texture = Texture::from_height_map(&map);
        assert_eq!(texture.pixels, vec![Color::BLACK, Color::WHITE]);
        assert_eq!(texture.to_rgba8(), vec![0, 0, 0, 255, 255, 255, 255, 255]);
    }
}
