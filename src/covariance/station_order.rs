//! Station reordering: hierarchical single-link clustering keeps
//! nearby stations adjacent in Σ so the dense blocks stay small even
//! though the matrix as built (indexed by [`crate::rows::defining_rows`])
//! is not itself reordered — this permutation is informational, used by
//! callers that want to render Σ or debug its block structure in
//! geographically coherent order.

use crate::geodesy::dist_azimuth;
use crate::model::Obs;
use crate::numerics::single_link_order;

/// Returns a permutation of distinct station indices (first occurrence
/// order) such that geographically nearby stations end up adjacent, via
/// single-link clustering on great-circle separation.
pub fn station_permutation(obs: &[Obs]) -> Vec<usize> {
    let mut stations: Vec<(&str, f64, f64)> = Vec::new();
    for o in obs {
        if !stations.iter().any(|(s, _, _)| *s == o.station) {
            stations.push((&o.station, o.sta_lat, o.sta_lon));
        }
    }
    let n = stations.len();
    if n <= 1 {
        return (0..n).collect();
    }
    let mut distance = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let (delta_deg, _, _) =
                dist_azimuth(stations[i].1, stations[i].2, stations[j].1, stations[j].2);
            distance[i][j] = delta_deg * crate::constants::DEG2KM;
        }
    }
    single_link_order(&distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Defining;

    fn obs(station: &str, lat: f64, lon: f64) -> Obs {
        Obs {
            station: station.to_string(),
            agency: "ISC".into(),
            sta_lat: lat,
            sta_lon: lon,
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
            delta: 10.0,
            esaz: 0.0,
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
    fn distinct_stations_each_get_a_slot() {
        let obs = vec![obs("AAA", 0.0, 0.0), obs("BBB", 0.0, 1.0), obs("AAA", 0.0, 0.0)];
        let perm = station_permutation(&obs);
        assert_eq!(perm.len(), 2);
    }
}
