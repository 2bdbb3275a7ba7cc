//! Physical and numerical constants shared across the locator.

/// Mean Earth radius (km), sphere used throughout the travel-time and
/// geodesy formulae (the locator works on a spherical Earth; ellipticity
/// is a correction term, not a change of datum).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// WGS84 flattening, used only to convert geographic to geocentric latitude.
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257223563;

/// Degrees-to-kilometres conversion on the mean Earth sphere.
pub const DEG2KM: f64 = 111.194924748;

pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;

/// Depth nodes (km) at which ellipticity coefficient grids are tabulated.
pub const ELLIPTICITY_DEPTH_NODES: [f64; 6] = [0.0, 100.0, 200.0, 300.0, 500.0, 700.0];

/// station-magnitude MAD scale constant converting MAD to a normal-equivalent sigma.
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// value used to scale the model-update step when it exceeds 1000 (arbitrary
/// "unreasonable step" guard; not exposed on [`crate::config::Config`]).
pub(crate) const MODEL_NORM_SCALE_LIMIT: f64 = 1000.0;

/// condition-number bands for adaptive SVD damping, see inversion kernel.
pub const COND_BAND_LOW: f64 = 30.0;
pub const COND_BAND_MID: f64 = 300.0;
pub const COND_BAND_HIGH: f64 = 3000.0;
pub const COND_ILL_CONDITIONED: f64 = 30_000.0;

pub const DAMPING_LOW: f64 = 0.01;
pub const DAMPING_MID: f64 = 0.05;
pub const DAMPING_HIGH: f64 = 0.10;
