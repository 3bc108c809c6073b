//! Noise-based procedural terrain tiles

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::navmesh::{EntityId, SourceGeometry};

use super::StaticScene;

/// Parameters controlling terrain generation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub seed: u32,
    pub scale: f32,        // Horizontal scale (larger = smoother)
    pub height_scale: f32, // Vertical scale (max height)
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // FBM persistence (0.5 typical)
    pub lacunarity: f32,   // FBM lacunarity (2.0 typical)
    pub cell_size: f32,    // Spacing between height samples
    pub tile_cells: usize, // Cells per tile edge
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 60.0,
            height_scale: 6.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            cell_size: 2.0,
            tile_cells: 8,
        }
    }
}

/// Heightfield terrain from fractal Brownian motion, cut into square tiles.
/// Each tile becomes one source entity.
pub struct TerrainGenerator {
    params: TerrainParams,
    noise: Fbm<Perlin>,
}

impl TerrainGenerator {
    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Terrain height at world position (x, z)
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let nx = (x / self.params.scale) as f64;
        let nz = (z / self.params.scale) as f64;

        // Noise in [-1, 1] mapped to [0, height_scale]
        let normalized = (self.noise.get([nx, nz]) + 1.0) / 2.0;
        (normalized * self.params.height_scale as f64) as f32
    }

    /// World-space edge length of one tile
    pub fn tile_size(&self) -> f32 {
        self.params.cell_size * self.params.tile_cells as f32
    }

    /// Heightfield geometry for the tile at integer tile coordinates.
    /// Neighboring tiles share their border samples exactly.
    pub fn tile(&self, id: EntityId, tile_x: i32, tile_z: i32, layer: u8) -> SourceGeometry {
        let cells = self.params.tile_cells;
        let cell = self.params.cell_size;
        let origin_x = tile_x as f32 * self.tile_size();
        let origin_z = tile_z as f32 * self.tile_size();

        let samples = cells + 1;
        let mut heights = Vec::with_capacity(samples * samples);
        for j in 0..samples {
            for i in 0..samples {
                heights.push(self.height_at(origin_x + i as f32 * cell, origin_z + j as f32 * cell));
            }
        }

        SourceGeometry::from_heightfield(
            id,
            Vec3::new(origin_x, 0.0, origin_z),
            cell,
            samples,
            samples,
            &heights,
            layer,
        )
    }

    /// Add a square of `(2 * radius + 1)²` tiles centered on tile (0, 0).
    /// Returns the number of tiles added.
    pub fn populate(&self, scene: &mut StaticScene, radius: i32, layer: u8) -> usize {
        let mut added = 0;
        for tile_z in -radius..=radius {
            for tile_x in -radius..=radius {
                let id = scene.next_id();
                scene.add(self.tile(id, tile_x, tile_z, layer));
                added += 1;
            }
        }
        log::info!(
            "Generated {} terrain tiles ({}m each, seed {})",
            added,
            self.tile_size(),
            self.params.seed
        );
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::GroundProjector;

    #[test]
    fn test_height_in_range() {
        let generator = TerrainGenerator::new(TerrainParams::default());
        let top = generator.params().height_scale;
        for i in 0..50 {
            let h = generator.height_at(i as f32 * 3.7, i as f32 * -1.3);
            // Fbm may overshoot its nominal range slightly
            assert!(h.is_finite() && h > -0.25 * top && h < 1.25 * top);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = TerrainGenerator::new(TerrainParams::default());
        let b = TerrainGenerator::new(TerrainParams::default());
        assert_eq!(a.height_at(12.5, -7.25), b.height_at(12.5, -7.25));
    }

    #[test]
    fn test_tiles_share_borders() {
        let generator = TerrainGenerator::new(TerrainParams::default());
        let cells = generator.params().tile_cells;
        let left = generator.tile(EntityId(0), 0, 0, 0);
        let right = generator.tile(EntityId(1), 1, 0, 0);
        assert_eq!(left.triangles.len(), cells * cells * 2);

        let samples = cells + 1;
        for j in 0..samples {
            let a = left.transform.transform_point3(left.vertices[j * samples + cells]);
            let b = right.transform.transform_point3(right.vertices[j * samples]);
            assert!((a - b).length() < 1e-4);
        }
    }

    #[test]
    fn test_populate_and_project() {
        let generator = TerrainGenerator::new(TerrainParams::default());
        let mut scene = StaticScene::new();
        assert_eq!(generator.populate(&mut scene, 1, 0), 9);
        assert_eq!(scene.len(), 9);

        let hit = scene.project_down(Vec3::new(3.1, 50.0, 2.4), 100.0).unwrap();
        assert!((hit.x - 3.1).abs() < 1e-4);
        assert!((hit.y - generator.height_at(3.1, 2.4)).abs() < generator.params().height_scale);
    }
}
