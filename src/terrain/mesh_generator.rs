// src/terrain/mesh_generator.rs
use glam::{Vec2, Vec3};

use crate::terrain::height_curve::HeightCurve;
use crate::terrain::height_map::HeightMap;

/// Highest level of detail accepted by the mesh builder.
pub const MAX_LEVEL_OF_DETAIL: u32 = 6;

/// Triangle mesh ready for a display surface.
///
/// Triangles are index triples wound counter-clockwise when seen from +Y.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshPayload {
    pub vertices: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub triangles: Vec<u32>,
    pub normals: Vec<Vec3>,
    /// Vertices along x, i.e. the row length of `vertices`.
    pub vertices_per_line: usize,
}

impl MeshPayload {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    fn add_triangle(&mut self, a: usize, b: usize, c: usize) {
        self.triangles.extend([a as u32, b as u32, c as u32]);
    }

    /// Rebuilds `normals` from the current vertices and triangles.
    ///
    /// Each vertex gets the normalised sum of the unnormalised face normals
    /// around it, which weights every face by its area.
    pub fn recalculate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.triangles.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let face = (self.vertices[b] - self.vertices[a]).cross(self.vertices[c] - self.vertices[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        for normal in &mut normals {
            let unit = normal.normalize_or_zero();
            *normal = if unit == Vec3::ZERO { Vec3::Y } else { unit };
        }

        self.normals = normals;
    }
}

/// Sampling stride for a level of detail: 1 at LOD 0, otherwise `lod * 2`.
pub fn mesh_simplification_increment(level_of_detail: u32) -> usize {
    if level_of_detail == 0 {
        1
    } else {
        level_of_detail as usize * 2
    }
}

/// Grid indices sampled along an axis of `len` cells: every `stride`-th index
/// plus the last one, so the border is always part of the mesh.
pub fn sample_indices(len: usize, stride: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = (0..len).step_by(stride.max(1)).collect();
    if indices.last() != Some(&(len - 1)) {
        indices.push(len - 1);
    }
    indices
}

/// Triangulates a height map around the origin.
///
/// Positions are centred on the grid: x runs from `-(w-1)/2`, z from `(h-1)/2`
/// downwards. UVs use the full grid size, so every LOD maps the same texture.
pub fn generate_terrain_mesh(
    height_map: &HeightMap,
    height_multiplier: f32,
    height_curve: &HeightCurve,
    level_of_detail: u32,
) -> MeshPayload {
    let width = height_map.width();
    let height = height_map.height();
    let top_left_x = (width as f32 - 1.0) / -2.0;
    let top_left_z = (height as f32 - 1.0) / 2.0;

    let increment = mesh_simplification_increment(level_of_detail.min(MAX_LEVEL_OF_DETAIL));
    let xs = sample_indices(width, increment);
    let ys = sample_indices(height, increment);
    let vertices_per_line = xs.len();

    let vertex_count = xs.len() * ys.len();
    let quad_count = xs.len().saturating_sub(1) * ys.len().saturating_sub(1);
    let mut mesh = MeshPayload {
        vertices: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        triangles: Vec::with_capacity(quad_count * 6),
        normals: Vec::new(),
        vertices_per_line,
    };

    let mut vertex_index = 0;
    for (row, &y) in ys.iter().enumerate() {
        for (column, &x) in xs.iter().enumerate() {
            let raw = height_map.get(x, y);
            mesh.vertices.push(Vec3::new(
                top_left_x + x as f32,
                height_curve.evaluate(raw) * height_multiplier,
                top_left_z - y as f32,
            ));
            mesh.uvs.push(Vec2::new(x as f32 / width as f32, y as f32 / height as f32));

            if column + 1 < xs.len() && row + 1 < ys.len() {
                let line = vertices_per_line;
                mesh.add_triangle(vertex_index, vertex_index + line + 1, vertex_index + line);
                mesh.add_triangle(vertex_index + line + 1, vertex_index, vertex_index + 1);
            }

            vertex_index += 1;
        }
    }

    mesh.recalculate_normals();
    mesh
}
