//! Location-quality metrics: azimuthal gaps, nearby-station counts
//! and the GT5 candidate flag, computed once from the converged defining
//! set rather than tracked iteration-by-iteration.

use crate::constants::DEG2KM;
use crate::model::Obs;

/// GT5 heuristic thresholds (Bondar & McLaughlin-style criteria): primary
/// gap, secondary gap, and the station-distance band that counts as
/// "close" for the minimum-close-station requirement.
const GT5_MAX_GAP_DEG: f64 = 110.0;
const GT5_MAX_SECONDARY_GAP_DEG: f64 = 160.0;
const GT5_CLOSE_STATION_KM: f64 = 30.0;
const GT5_MIN_CLOSE_STATIONS: usize = 1;
const NEAR_STATION_KM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality {
    pub gap: f64,
    pub secondary_gap: f64,
    /// count of distinct stations within [`NEAR_STATION_KM`] of each other
    /// (co-located or near-co-located station pairs, informational).
    pub near_station_pairs: usize,
    pub is_gt5_candidate: bool,
}

/// Sorted distinct station azimuths (deg) among currently-defining
/// observations.
fn defining_azimuths(obs: &[Obs]) -> Vec<f64> {
    let mut seen = std::collections::HashSet::new();
    let mut az: Vec<f64> = obs
        .iter()
        .filter(|o| o.defining.any())
        .filter(|o| seen.insert(o.station.clone()))
        .map(|o| o.esaz)
        .collect();
    az.sort_by(|a, b| a.partial_cmp(b).unwrap());
    az
}

/// Primary azimuthal gap: the largest consecutive angular separation
/// (wrapping at 360) between defining-station azimuths.
fn primary_gap(az: &[f64]) -> f64 {
    if az.len() < 2 {
        return 360.0;
    }
    let n = az.len();
    (0..n)
        .map(|i| {
            let next = az[(i + 1) % n];
            let this = az[i];
            if i + 1 < n {
                next - this
            } else {
                next + 360.0 - this
            }
        })
        .fold(0.0, f64::max)
}

/// Secondary azimuthal gap: the largest gap that would remain after
/// removing any single station, i.e. the largest sum of two consecutive
/// gaps.
fn secondary_gap(az: &[f64]) -> f64 {
    if az.len() < 3 {
        return primary_gap(az);
    }
    let n = az.len();
    let gaps: Vec<f64> = (0..n)
        .map(|i| {
            let next = az[(i + 1) % n];
            let this = az[i];
            if i + 1 < n {
                next - this
            } else {
                next + 360.0 - this
            }
        })
        .collect();
    (0..n).map(|i| gaps[i] + gaps[(i + 1) % n]).fold(0.0, f64::max)
}

/// Counts unordered pairs of distinct defining stations separated by less
/// than [`NEAR_STATION_KM`].
fn near_station_pairs(obs: &[Obs]) -> usize {
    let mut seen: Vec<(&str, f64, f64)> = Vec::new();
    for o in obs.iter().filter(|o| o.defining.any()) {
        if !seen.iter().any(|(s, _, _)| *s == o.station) {
            seen.push((&o.station, o.sta_lat, o.sta_lon));
        }
    }
    let mut count = 0;
    for i in 0..seen.len() {
        for j in (i + 1)..seen.len() {
            let (delta, _, _) = crate::geodesy::dist_azimuth(seen[i].1, seen[i].2, seen[j].1, seen[j].2);
            if delta * DEG2KM < NEAR_STATION_KM {
                count += 1;
            }
        }
    }
    count
}

/// Computes the converged-solution quality metrics from the final
/// defining set.
pub fn compute(obs: &[Obs]) -> Quality {
    let az = defining_azimuths(obs);
    let gap = primary_gap(&az);
    let sgap = secondary_gap(&az);

    let close_stations = obs
        .iter()
        .filter(|o| o.defining.any() && o.delta * DEG2KM < GT5_CLOSE_STATION_KM)
        .map(|o| o.station.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    let is_gt5_candidate =
        gap <= GT5_MAX_GAP_DEG && sgap <= GT5_MAX_SECONDARY_GAP_DEG && close_stations >= GT5_MIN_CLOSE_STATIONS;

    Quality { gap, secondary_gap: sgap, near_station_pairs: near_station_pairs(obs), is_gt5_candidate }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Defining;

    fn obs_at(esaz: f64, delta: f64, station: &str) -> Obs {
        Obs {
            station: station.to_string(),
            agency: "ISC".into(),
            sta_lat: 0.0,
            sta_lon: 0.0,
            sta_elevation_m: 0.0,
            reported_phase: "P".into(),
            phase: "P".into(),
            time: Some(0.0),
            azimuth: None,
            slowness: None,
            deltim: 1.0,
            delaz: 5.0,
            delslo: 1.0,
            defining: Defining { time: true, azimuth: false, slowness: false },
            is_first_arrival: false,
            is_duplicate: false,
            delta,
            esaz,
            seaz: 0.0,
            predicted_ttime: None,
            dtdd: None,
            dtdh: None,
            d2tdd2: None,
            d2tdh2: None,
            bounce_delta: None,
            tt_model: None,
            time_residual: None,
            azimuth_residual: None,
            slowness_residual: None,
            covariance_index: None,
            amplitudes: Vec::new(),
        }
    }

    #[test]
    fn even_ring_has_small_gap() {
        let obs = vec![
            obs_at(0.0, 1.0, "AAA"),
            obs_at(90.0, 1.0, "BBB"),
            obs_at(180.0, 1.0, "CCC"),
            obs_at(270.0, 1.0, "DDD"),
        ];
        let q = compute(&obs);
        assert!((q.gap - 90.0).abs() < 1e-9);
    }

    #[test]
    fn single_station_has_full_gap() {
        let obs = vec![obs_at(0.0, 1.0, "AAA")];
        let q = compute(&obs);
        assert_eq!(q.gap, 360.0);
    }

    #[test]
    fn tight_ring_is_not_gt5() {
        let obs = vec![
            obs_at(0.0, 80.0, "AAA"),
            obs_at(10.0, 80.0, "BBB"),
            obs_at(350.0, 80.0, "CCC"),
        ];
        let q = compute(&obs);
        assert!(!q.is_gt5_candidate);
    }
}
