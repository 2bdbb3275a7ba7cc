//! Corrections applied after table lookup:
//! ellipticity (Dziewonski-Gilbert), elevation, and bounce-point.

use crate::constants::DEG2KM;
use crate::geodesy::geocentric_colatitude;
use crate::tables::EllipticityCoefficients;

/// tcor = 0.25*(1+3*cos(2*theta))*tau0 + (sqrt(3)/2)*sin(2*theta)*cos(a)*tau1
///        + (sqrt(3)/2)*sin(theta)^2*cos(2*a)*tau2
/// where theta is geocentric colatitude (rad) and a is the event-to-station
/// azimuth (rad). Must match bit-exactly across implementations.
pub fn ellipticity_correction(
    ec: &EllipticityCoefficients,
    delta_deg: f64,
    depth_km: f64,
    event_lat_deg: f64,
    esaz_deg: f64,
) -> Result<f64, crate::numerics::InterpolationError> {
    let (tau0, tau1, tau2) = ec.lookup(delta_deg, depth_km)?;
    let theta = geocentric_colatitude(event_lat_deg);
    let a = esaz_deg * crate::constants::DEG2RAD;

    let sc0 = 0.25 * (1.0 + 3.0 * (2.0 * theta).cos());
    let sc1 = 3.0_f64.sqrt() / 2.0 * (2.0 * theta).sin();
    let sc2 = 3.0_f64.sqrt() / 2.0 * theta.sin().powi(2);

    Ok(sc0 * tau0 + sc1 * a.cos() * tau1 + sc2 * (2.0 * a).cos() * tau2)
}

/// Scans `phase` right-to-left for the last uppercase 'P' or 'S' to pick
/// the last-leg surface velocity.
fn last_leg_velocity(phase: &str, p_vel: f64, s_vel: f64) -> Option<f64> {
    phase.chars().rev().find_map(|c| match c {
        'P' => Some(p_vel),
        'S' => Some(s_vel),
        _ => None,
    })
}

/// tcor = (elev_m/1000 / v) * sqrt(1 - (v*p/DEG2KM)^2), p (ray parameter,
/// s/deg) clipped so the radicand stays non-negative.
pub fn elevation_correction(phase: &str, elevation_m: f64, ray_param: f64, p_vel: f64, s_vel: f64) -> f64 {
    let Some(v) = last_leg_velocity(phase, p_vel, s_vel) else {
        return 0.0;
    };
    let term = (v * ray_param / DEG2KM).clamp(-1.0, 1.0);
    (elevation_m / 1000.0 / v) * (1.0 - term * term).sqrt()
}

/// Bounce-point surface-velocity coefficient: 1 for an up-going P or S leg
/// (e.g. `pP`, `sS` share-same-phase up-leg handled by caller), 2 for the
/// classic pP/sS-style reflected phases, and the mixed pS/sP form uses its
/// own two-velocity expression. Bit-exact across table sources.
pub fn bounce_point_correction(
    phase: &str,
    water_depth_m: Option<f64>,
    elevation_m: f64,
    ray_param: f64,
    p_vel: f64,
    s_vel: f64,
) -> f64 {
    let is_mixed = matches!(phase, "pS" | "sP");
    if is_mixed {
        let tp = (p_vel * ray_param).clamp(-1.0, 1.0);
        let ts = (s_vel * ray_param).clamp(-1.0, 1.0);
        let dz = elevation_m / 1000.0;
        return ((1.0 / p_vel) * (1.0 - tp * tp).sqrt() + (1.0 / s_vel) * (1.0 - ts * ts).sqrt()) * dz;
    }

    let coefficient = if phase.starts_with("pP") || phase.starts_with("sS") || phase.starts_with("sP") || phase.starts_with("pS") {
        2.0
    } else {
        1.0
    };
    let base = elevation_correction(phase, elevation_m, ray_param, p_vel, s_vel) * coefficient;

    // pwP: water-column correction at 1.5 km/s for water deeper than 1.5 km,
    // using the same ray-parameter geometry.
    if phase == "pwP" {
        if let Some(depth) = water_depth_m {
            if depth > 1500.0 {
                let v = 1.5;
                let term = (v * ray_param / DEG2KM).clamp(-1.0, 1.0);
                let water_col = (1.5 / 1000.0) * v * (1.0 - term * term).sqrt();
                return base + water_col;
            }
        }
    }
    base
}
