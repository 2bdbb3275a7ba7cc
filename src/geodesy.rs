//! Spherical geodesy primitives: distance/azimuth, point-at-delta-azimuth,
//! and geographic-to-geocentric latitude conversion.

use crate::constants::{DEG2RAD, EARTH_FLATTENING, RAD2DEG};

/// Great-circle distance and forward/back azimuths between two points on
/// the sphere, all in degrees.
///
/// Returns `(delta_deg, azimuth_deg, back_azimuth_deg)`.
pub fn dist_azimuth(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64, f64) {
    if (lat1 - lat2).abs() < 1e-12 && (lon1 - lon2).abs() < 1e-12 {
        return (0.0, 0.0, 0.0);
    }

    let (phi1, phi2) = (lat1 * DEG2RAD, lat2 * DEG2RAD);
    let dlon = (lon2 - lon1) * DEG2RAD;

    let cos_delta = phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * dlon.cos();
    let delta = cos_delta.clamp(-1.0, 1.0).acos();

    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
    let mut az = y.atan2(x) * RAD2DEG;
    if az < 0.0 {
        az += 360.0;
    }

    let y2 = (-dlon).sin() * phi1.cos();
    let x2 = phi2.cos() * phi1.sin() - phi2.sin() * phi1.cos() * (-dlon).cos();
    let mut baz = y2.atan2(x2) * RAD2DEG;
    if baz < 0.0 {
        baz += 360.0;
    }

    (delta * RAD2DEG, az, baz)
}

/// Given a starting point and a great-circle distance/azimuth, returns the
/// destination point `(lat', lon')` in degrees.
pub fn point_at_delta_azimuth(lat: f64, lon: f64, delta_deg: f64, az_deg: f64) -> (f64, f64) {
    let phi1 = lat * DEG2RAD;
    let lambda1 = lon * DEG2RAD;
    let delta = delta_deg * DEG2RAD;
    let theta = az_deg * DEG2RAD;

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();

    let y = theta.sin() * delta.sin() * phi1.cos();
    let x = delta.cos() - phi1.sin() * sin_phi2;
    let lambda2 = lambda1 + y.atan2(x);

    let mut lon2 = lambda2 * RAD2DEG;
    // normalize into [-180, 180)
    lon2 = ((lon2 + 180.0).rem_euclid(360.0)) - 180.0;

    (phi2 * RAD2DEG, lon2)
}

/// Geographic latitude (deg) to geocentric colatitude (rad), using the
/// WGS84 flattening. Used by the ellipticity corrector and the NA
/// search box.
pub fn geocentric_colatitude(geographic_lat_deg: f64) -> f64 {
    let phi = geographic_lat_deg * DEG2RAD;
    let geocentric = ((1.0 - EARTH_FLATTENING).powi(2) * phi.tan()).atan();
    std::f64::consts::FRAC_PI_2 - geocentric
}
