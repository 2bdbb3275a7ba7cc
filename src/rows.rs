//! Shared row enumeration: both the data-covariance builder
//! and the inversion kernel's G/d assembly must agree on exactly which
//! observation contributes which row and in what order — time rows
//! first, then azimuth rows, then slowness rows, each block in
//! observation-array order. Centralising it here means the two modules
//! can never silently drift out of alignment.

use crate::model::Obs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatumClass {
    Time,
    Azimuth,
    Slowness,
}

/// `(observation index, datum class)` for every currently-defining row,
/// in the canonical block order: all time rows, then all azimuth rows,
/// then all slowness rows.
pub fn defining_rows(obs: &[Obs]) -> Vec<(usize, DatumClass)> {
    let mut rows = Vec::new();
    for (i, o) in obs.iter().enumerate() {
        if o.defining.time {
            rows.push((i, DatumClass::Time));
        }
    }
    for (i, o) in obs.iter().enumerate() {
        if o.defining.azimuth {
            rows.push((i, DatumClass::Azimuth));
        }
    }
    for (i, o) in obs.iter().enumerate() {
        if o.defining.slowness {
            rows.push((i, DatumClass::Slowness));
        }
    }
    rows
}

/// The set of distinct phase names among currently-defining observations,
/// used by the inversion kernel to decide whether G/Σ/W need a full
/// reallocation (the set changed) or only a squeeze (count shrank).
pub fn defining_phase_set(obs: &[Obs]) -> std::collections::BTreeSet<String> {
    obs.iter()
        .filter(|o| o.defining.any())
        .map(|o| o.phase.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Defining;

    fn obs(time: bool, az: bool, slow: bool) -> Obs {
        Obs {
            station: "AAA".into(),
            agency: "ISC".into(),
            sta_lat: 0.0,
            sta_lon: 0.0,
            sta_elevation_m: 0.0,
            reported_phase: "P".into(),
            phase: "P".into(),
            time: Some(0.0),
            azimuth: Some(0.0),
            slowness: Some(0.0),
            deltim: 1.0,
            delaz: 5.0,
            delslo: 1.0,
            defining: Defining { time, azimuth: az, slowness: slow },
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
    fn rows_grouped_by_class_blocks() {
        let obs = vec![obs(true, true, false), obs(false, true, true)];
        let rows = defining_rows(&obs);
        assert_eq!(
            rows,
            vec![
                (0, DatumClass::Time),
                (0, DatumClass::Azimuth),
                (1, DatumClass::Azimuth),
                (1, DatumClass::Slowness),
            ]
        );
    }
}
