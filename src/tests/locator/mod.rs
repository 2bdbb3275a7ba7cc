mod correlated_error_squeeze;
mod depth_phase_resolution;
mod ms_network_magnitude;
mod shallow_airquake_guard;
mod singular_geometry;
mod teleseismic_p_cluster;

use crate::config::Config;
use crate::model::{Amp, Defining, Hypo, MagnitudeType, Obs};
use crate::tables::{
    EllipticityTableSet, RegionDepthGrid, Tables, TopographyGrid, TtTable, TtTableSet, Variogram,
};

/// A flat (delta, depth)-independent table: travel time grows linearly
/// with distance at 1 s/deg, useful for scenarios where the exact
/// residual shape doesn't matter, only that a prediction exists.
pub(super) fn flat_table(phase: &str) -> TtTable {
    TtTable {
        phase: phase.to_string(),
        distances: vec![0.0, 30.0, 60.0, 90.0, 180.0],
        depths: vec![0.0, 100.0, 300.0, 700.0],
        ttime: vec![
            vec![0.0, 0.0, 0.0, 0.0],
            vec![30.0, 30.0, 30.0, 30.0],
            vec![60.0, 60.0, 60.0, 60.0],
            vec![90.0, 90.0, 90.0, 90.0],
            vec![180.0, 180.0, 180.0, 180.0],
        ],
        dtdd: vec![vec![1.0; 4]; 5],
        dtdh: vec![vec![0.01; 4]; 5],
        bounce_delta: None,
    }
}

pub(super) fn depth_phase_table(phase: &str, offset_s: f64) -> TtTable {
    let mut t = flat_table(phase);
    for row in t.ttime.iter_mut() {
        for v in row.iter_mut() {
            *v += offset_s;
        }
    }
    t.bounce_delta = Some(vec![vec![0.0; 4]; 5]);
    t
}

pub(super) fn tables_with(phases: &[(&str, TtTable)]) -> Tables {
    let mut tt = TtTableSet::new();
    for (_, table) in phases {
        tt.insert(table.clone());
    }
    let topography = TopographyGrid::from_bytes(&[0, 0], 1, 1, 1.0, -90.0, -180.0).unwrap();
    let region_depth = RegionDepthGrid::from_bytes(&[0, 0, 0, 0], 1, 1, 1.0, -90.0, -180.0).unwrap();
    Tables {
        travel_time: tt,
        ellipticity: EllipticityTableSet::new(),
        topography,
        region_depth,
        magnitude_q: std::collections::HashMap::new(),
        variogram: Variogram { max_separation_km: 2000.0, nugget: 0.1, sill: 1.0, samples: vec![(500.0, 0.5)] },
        stations: std::collections::HashMap::new(),
    }
}

pub(super) fn base_obs(station: &str, lat: f64, lon: f64, phase: &str, delta: f64, esaz: f64, time: f64) -> Obs {
    Obs {
        station: station.to_string(),
        agency: "ISC".into(),
        sta_lat: lat,
        sta_lon: lon,
        sta_elevation_m: 0.0,
        reported_phase: phase.to_string(),
        phase: phase.to_string(),
        time: Some(time),
        azimuth: None,
        slowness: None,
        deltim: 1.0,
        delaz: 10.0,
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

pub(super) fn amp(amplitude: f64, period: f64, mag_type: MagnitudeType) -> Amp {
    amp_component(amplitude, period, 'Z', mag_type)
}

pub(super) fn amp_component(amplitude: f64, period: f64, component: char, mag_type: MagnitudeType) -> Amp {
    Amp {
        amplitude,
        period,
        component,
        channel: "BHZ".into(),
        snr: Some(10.0),
        mag_type,
        station_magnitude: None,
        defining: true,
    }
}

pub(super) fn seed_hypo(origin_time: f64, lat: f64, lon: f64, depth: f64) -> Hypo {
    Hypo::seed(origin_time, lat, lon, depth)
}

pub(super) fn default_cfg() -> Config {
    Config::teleseismic()
}
