use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Linear RGBA colour, components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), channel(self.a)]
    }
}

/// One band of the region table: every height up to `height` gets `color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainType {
    #[serde(default)]
    pub name: String,
    pub height: f32,
    pub color: Color,
}

impl TerrainType {
    pub fn new(name: impl Into<String>, height: f32, color: Color) -> Self {
        TerrainType {
            name: name.into(),
            height,
            color,
        }
    }
}

/// Ordered height thresholds. Lookup is first match wins in table order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionTable {
    regions: Vec<TerrainType>,
}

impl RegionTable {
    /// Builds a table without checking it. See [`validate`](Self::validate).
    pub fn new(regions: Vec<TerrainType>) -> Self {
        RegionTable { regions }
    }

    pub fn regions(&self) -> &[TerrainType] {
        &self.regions
    }

    /// Colour of the first region whose threshold is at or above `height`.
    ///
    /// `None` only happens for tables whose last threshold is below the height,
    /// which [`validate`](Self::validate) rejects.
    pub fn classify(&self, height: f32) -> Option<Color> {
        self.regions
            .iter()
            .find(|region| height <= region.height)
            .map(|region| region.color)
    }

    /// Checks thresholds are non-decreasing and the last one covers 1.0.
    pub fn validate(&self) -> Result<()> {
        let Some(last) = self.regions.last() else {
            return Err(TerrainError::InvalidRegionTable("table is empty".to_string()));
        };

        if let Some(pair) = self
            .regions
            .windows(2)
            .find(|pair| !(pair[0].height <= pair[1].height))
        {
            return Err(TerrainError::InvalidRegionTable(format!(
                "threshold of '{}' ({}) is above the following '{}' ({})",
                pair[0].name, pair[0].height, pair[1].name, pair[1].height
            )));
        }

        if !(last.height >= 1.0) {
            return Err(TerrainError::InvalidRegionTable(format!(
                "last threshold {} does not cover 1.0",
                last.height
            )));
        }

        Ok(())
    }

    /// Water/sand/grass/rock/snow bands used when no table is configured.
    pub fn reference() -> Self {
        RegionTable::new(vec![
            TerrainType::new("deep water", 0.3, Color::rgb(0.20, 0.39, 0.76)),
            TerrainType::new("shallow water", 0.4, Color::rgb(0.21, 0.40, 0.80)),
            TerrainType::new("sand", 0.45, Color::rgb(0.82, 0.82, 0.50)),
            TerrainType::new("grass", 0.55, Color::rgb(0.34, 0.60, 0.10)),
            TerrainType::new("grass 2", 0.6, Color::rgb(0.24, 0.42, 0.08)),
            TerrainType::new("rock", 0.7, Color::rgb(0.36, 0.27, 0.23)),
            TerrainType::new("rock 2", 0.9, Color::rgb(0.29, 0.23, 0.21)),
            TerrainType::new("snow", 1.0, Color::WHITE),
        ])
    }
}
