use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct RasteriserParameters {
    // upper limit of edge crossings on a single scanline
    pub max_nodes_per_row: usize,
    // name of the class code attribute in the topographic database
    pub class_attribute: String,
}

impl Default for RasteriserParameters {
    fn default() -> Self {
        Self {
            max_nodes_per_row: 10_000,
            class_attribute: "LUOKKA".to_string(),
        }
    }
}

/// What to do with samples below sea level when they enter a voxel grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NegativeHeightPolicy {
    #[default]
    Keep,
    ClampToZero,
}

impl NegativeHeightPolicy {
    pub fn apply(&self, z: f64) -> f64 {
        match self {
            NegativeHeightPolicy::Keep => z,
            NegativeHeightPolicy::ClampToZero => z.max(0.),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridParameters {
    pub negative_heights: NegativeHeightPolicy,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangulationParameters {
    /// Upper bound for the jitter, which must stay below half of it so a
    /// shifted vertex cannot cross the tolerance. Nothing else reads it.
    pub plane_distance_tolerance: f64,
    // radius of the random shift added to every vertex, 0 disables it
    pub jitter_radius: f64,
}

impl Default for TriangulationParameters {
    fn default() -> Self {
        Self {
            plane_distance_tolerance: 1e-9,
            jitter_radius: 1e-10,
        }
    }
}

impl TriangulationParameters {
    pub fn validate(&self) -> Result<()> {
        if self.jitter_radius < 0. || self.jitter_radius >= self.plane_distance_tolerance / 2. {
            return Err(Error::InvalidJitter {
                radius: self.jitter_radius,
                tolerance: self.plane_distance_tolerance,
            });
        }
        Ok(())
    }
}
