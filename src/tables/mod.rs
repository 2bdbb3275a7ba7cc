//! Table services: loaders and lookup helpers for the long-lived,
//! read-only auxiliary data the predictor and magnitude layers consume.
//! All loaders return [`crate::error::TableError`] on malformed input; none
//! of them touch per-event state.

mod ellipticity;
mod magnitude_q;
mod region_depth;
mod topography;
mod travel_time;
mod variogram;

pub use ellipticity::{EllipticityCoefficients, EllipticityTableSet};
pub use magnitude_q::MagnitudeQTable;
pub use region_depth::RegionDepthGrid;
pub use topography::TopographyGrid;
pub use travel_time::{TtTable, TtTableSet, FIRST_P_INDEX, FIRST_S_INDEX};
pub use variogram::Variogram;

use crate::model::Station;
use std::collections::HashMap;

/// The full read-only table set borrowed by the core for the lifetime of
/// the host program: TT tables, ellipticity coefficients, topography,
/// region default-depth grid, magnitude-Q tables, variogram and the
/// station table.
pub struct Tables {
    pub travel_time: TtTableSet,
    pub ellipticity: EllipticityTableSet,
    pub topography: TopographyGrid,
    pub region_depth: RegionDepthGrid,
    pub magnitude_q: HashMap<crate::model::MagnitudeType, MagnitudeQTable>,
    pub variogram: Variogram,
    pub stations: HashMap<String, Station>,
}
