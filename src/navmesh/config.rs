//! Navmesh build configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;

use super::entity::LayerMask;
use super::stage::STAGE_PLAN;

/// Largest Chebyshev radius, in columns, the rings may cover together
pub const MAX_RING_RADIUS: u64 = 1024;

/// Navmesh build settings.
///
/// Every field has a default, so a JSON file only needs the values it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Edge length of a chunk in world units
    pub chunk_size: f32,
    /// Octree subdivision depth of the vertex index
    pub vertex_depth: u32,
    /// Octree subdivision depth of the triangle index
    pub triangle_depth: u32,
    /// Width of each ring in chunks, innermost first. One ring per build level.
    pub ring_widths: Vec<u32>,
    /// Vertices with equal snapped X/Z closer than this in Y are welded
    pub merge_threshold: f32,
    /// Grid X/Z coordinates are snapped to
    pub snap_grid: f32,
    /// Steepest walkable face in degrees from +Y
    pub max_slope_deg: f32,
    /// Wall-time allowance for one pipeline step
    pub work_budget_ms: f32,
    /// Optional cap on items per step, for deterministic slicing
    pub max_items_per_step: Option<usize>,
    /// Layers picked up by discovery
    pub layer_mask: LayerMask,
    /// Re-run discovery whenever the observer changes column
    pub map_expanding: bool,
    /// Only link neighbors whose centers see each other
    pub link_requires_clearance: bool,
    /// Height above triangle centers used for link clearance probes
    pub link_probe_height: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16.0,
            vertex_depth: 3,
            triangle_depth: 3,
            ring_widths: vec![1, 1, 1, 1],
            merge_threshold: 0.5,
            snap_grid: 0.5,
            max_slope_deg: 45.0,
            work_budget_ms: 4.0,
            max_items_per_step: None,
            layer_mask: LayerMask::ALL,
            map_expanding: true,
            link_requires_clearance: false,
            link_probe_height: 0.5,
        }
    }
}

impl NavConfig {
    /// Load from a JSON file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: NavConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Number of build levels (one per ring)
    pub fn level_count(&self) -> usize {
        self.ring_widths.len()
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")))
            }
        };

        positive("chunk_size", self.chunk_size)?;
        positive("merge_threshold", self.merge_threshold)?;
        positive("snap_grid", self.snap_grid)?;
        positive("work_budget_ms", self.work_budget_ms)?;
        positive("link_probe_height", self.link_probe_height)?;

        if !(0.0..=180.0).contains(&self.max_slope_deg) {
            return Err(Error::InvalidConfig(format!(
                "max_slope_deg must be within 0..=180, got {}",
                self.max_slope_deg
            )));
        }
        if self.vertex_depth > 8 || self.triangle_depth > 8 {
            return Err(Error::InvalidConfig("index depth must be at most 8".into()));
        }
        if self.ring_widths.len() < STAGE_PLAN.len() {
            return Err(Error::InvalidConfig(format!(
                "need at least {} rings, got {}",
                STAGE_PLAN.len(),
                self.ring_widths.len()
            )));
        }
        if self.ring_widths.contains(&0) {
            return Err(Error::InvalidConfig("ring widths must be at least 1".into()));
        }
        let radius: u64 = self.ring_widths.iter().map(|&w| u64::from(w)).sum();
        if radius > MAX_RING_RADIUS {
            return Err(Error::InvalidConfig(format!(
                "ring widths add up to {radius} columns, at most {MAX_RING_RADIUS} allowed"
            )));
        }
        if self.max_items_per_step == Some(0) {
            return Err(Error::InvalidConfig("max_items_per_step must be at least 1".into()));
        }
        Ok(())
    }
}
