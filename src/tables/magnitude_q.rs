//! Magnitude attenuation (Q) tables: same node-grid + bilinear
//! fetch shape as a travel-time table, reused here rather than hand-rolling
//! a bespoke lookup.

use crate::numerics::{bilinear_interpolate, InterpolationError};

#[derive(Debug, Clone)]
pub struct MagnitudeQTable {
    pub distances: Vec<f64>,
    pub depths: Vec<f64>,
    pub q: Vec<Vec<f64>>,
}

impl MagnitudeQTable {
    pub fn lookup(&self, delta_deg: f64, depth_km: f64) -> Result<f64, InterpolationError> {
        bilinear_interpolate(&self.distances, &self.depths, &self.q, delta_deg, depth_km)
    }

    /// A constant-value Q table spanning the whole (distance, depth)
    /// domain, for tests that only care about the magnitude formula, not
    /// the attenuation curve.
    #[cfg(test)]
    pub(crate) fn flat(q: f64) -> Self {
        Self { distances: vec![0.0, 180.0], depths: vec![0.0, 700.0], q: vec![vec![q, q], vec![q, q]] }
    }
}
