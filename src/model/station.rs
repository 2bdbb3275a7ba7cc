#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A seismic station: key, coordinates, elevation. Loaded once and borrowed
/// for the lifetime of the host program.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Station {
    pub key: String,
    pub lat: f64,
    pub lon: f64,
    /// elevation above sea level, meters.
    pub elevation_m: f64,
}

impl Station {
    pub fn new(key: impl Into<String>, lat: f64, lon: f64, elevation_m: f64) -> Self {
        Self {
            key: key.into(),
            lat,
            lon,
            elevation_m,
        }
    }
}
