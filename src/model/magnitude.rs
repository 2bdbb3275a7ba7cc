#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A supported magnitude type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MagnitudeType {
    Mb,
    Ms,
    Ml,
    MB,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReadingMagnitude {
    pub mag_type: MagnitudeType,
    pub station: String,
    pub agency: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationMagnitude {
    pub mag_type: MagnitudeType,
    pub station: String,
    pub value: f64,
    pub num_readings: usize,
}

/// Network-aggregated magnitude: median of station magnitudes after a
/// 20%-trimmed MAD, requiring at least `MinNetmagSta` contributing
/// stations. `uncertainty = 1.4826 * median(|station_i - median|)`
/// over the trimmed set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkMagnitude {
    pub mag_type: MagnitudeType,
    pub value: f64,
    pub uncertainty: f64,
    pub num_stations: usize,
}
