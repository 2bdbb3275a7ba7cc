//! Neighbourhood Algorithm grid search: a 4-D (origin time,
//! latitude, longitude, depth) derivative-free search used as a robust
//! starting point before the linearised inversion kernel takes over, or
//! to re-anchor it after a divergence.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::Config;
use crate::context::Context;
use crate::geodesy::{dist_azimuth, point_at_delta_azimuth};
use crate::model::{Hypo, Obs};
use crate::prediction::{predict, FirstArrivingPolicy, PredictionRequest};
use crate::tables::Tables;

/// One evaluated point in the 4-D search space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaSample {
    pub origin_time: f64,
    pub lat: f64,
    pub lon: f64,
    pub depth: f64,
    pub misfit: f64,
}

#[derive(Debug, Clone)]
pub struct NaResult {
    pub best: NaSample,
    /// every point evaluated, in generation order, kept only when the
    /// caller asks for a dump (see [`search`]'s `keep_samples` argument).
    pub samples: Vec<NaSample>,
}

/// Lp-norm misfit of a trial hypocenter against every currently
/// defining time observation, normalised by each observation's prior
/// sigma so high-precision picks dominate the landscape.
fn misfit(trial: &Hypo, obs: &[Obs], tables: &Tables, ctx: &Context, cfg: &Config) -> f64 {
    let p = cfg.na.lp_norm;
    let mut acc = 0.0;
    let mut n = 0usize;

    for o in obs {
        if !o.defining.time {
            continue;
        }
        let Some(reported) = o.time else { continue };
        let (delta, esaz, _) = dist_azimuth(trial.lat, trial.lon, o.sta_lat, o.sta_lon);
        let req = PredictionRequest {
            phase: &o.phase,
            event_lat: trial.lat,
            event_lon: trial.lon,
            event_depth_km: trial.depth,
            delta_deg: delta,
            esaz_deg: esaz,
            sta_elevation_m: o.sta_elevation_m,
            water_depth_m: None,
        };
        let Ok(prediction) =
            predict(&req, &tables.travel_time, &tables.ellipticity, ctx, cfg, false, FirstArrivingPolicy::AllowFallback)
        else {
            continue;
        };
        let predicted = trial.origin_time + prediction.ttime;
        let resid = (reported - predicted) / o.deltim.max(1e-6);
        acc += resid.abs().powf(p);
        n += 1;
    }

    if n == 0 {
        f64::INFINITY
    } else {
        (acc / n as f64).powf(1.0 / p)
    }
}

fn evaluate(
    center: &Hypo,
    dt: f64,
    dlat_deg: f64,
    dlon_deg: f64,
    ddepth: f64,
    obs: &[Obs],
    tables: &Tables,
    ctx: &Context,
    cfg: &Config,
) -> NaSample {
    let delta = (dlat_deg * dlat_deg + dlon_deg * dlon_deg).sqrt();
    let (lat, lon) = if delta > 1e-9 {
        let az = dlon_deg.atan2(dlat_deg).to_degrees();
        let az = if az < 0.0 { az + 360.0 } else { az };
        point_at_delta_azimuth(center.lat, center.lon, delta, az)
    } else {
        (center.lat, center.lon)
    };
    let depth = (center.depth + ddepth).clamp(0.0, cfg.depth.max_hypocenter_depth);
    let trial = Hypo::seed(center.origin_time + dt, lat, lon, depth);
    let m = misfit(&trial, obs, tables, ctx, cfg);
    NaSample { origin_time: trial.origin_time, lat: trial.lat, lon: trial.lon, depth: trial.depth, misfit: m }
}

/// Runs the NA search: `initial_sample` uniform draws across the
/// configured box, then `iter_max` resampling rounds that draw
/// `next_sample` new points as Gaussian perturbations around the
/// `cells` lowest-misfit points so far (a walk-on-Voronoi approximation
/// that favours the neighbourhood of good cells without building their
/// exact boundaries). `keep_samples` controls whether the full sample
/// history is returned for diagnostics.
pub fn search(
    center: &Hypo,
    obs: &[Obs],
    tables: &Tables,
    ctx: &mut Context,
    cfg: &Config,
    keep_samples: bool,
) -> NaResult {
    let radius = cfg.na.search_radius_deg;
    let depth_radius = cfg.na.search_depth_km;
    let ot_radius = cfg.na.search_ot_s;

    let mut all: Vec<NaSample> = Vec::with_capacity(cfg.na.initial_sample);

    for _ in 0..cfg.na.initial_sample {
        let dt = ctx.rng.random_range(-ot_radius..=ot_radius);
        let dlat = ctx.rng.random_range(-radius..=radius);
        let dlon = ctx.rng.random_range(-radius..=radius);
        let ddepth = ctx.rng.random_range(-depth_radius..=depth_radius);
        all.push(evaluate(center, dt, dlat, dlon, ddepth, obs, tables, ctx, cfg));
    }

    for _ in 0..cfg.na.iter_max {
        all.sort_by(|a, b| a.misfit.partial_cmp(&b.misfit).unwrap());
        let cells = cfg.na.cells.min(all.len()).max(1);
        let per_cell = (cfg.na.next_sample / cells).max(1);

        let step_scale_ot = (ot_radius / 10.0).max(1e-6);
        let step_scale_deg = (radius / 10.0).max(1e-6);
        let step_scale_depth = (depth_radius / 10.0).max(1e-6);
        let normal_ot = Normal::new(0.0, step_scale_ot).unwrap();
        let normal_deg = Normal::new(0.0, step_scale_deg).unwrap();
        let normal_depth = Normal::new(0.0, step_scale_depth).unwrap();

        let mut generation = Vec::with_capacity(per_cell * cells);
        for cell in all.iter().take(cells) {
            for _ in 0..per_cell {
                let dt = (cell.origin_time - center.origin_time) + normal_ot.sample(&mut ctx.rng);
                let (delta_from_center, az, _) = dist_azimuth(center.lat, center.lon, cell.lat, cell.lon);
                let base_dlat = delta_from_center * az.to_radians().cos();
                let base_dlon = delta_from_center * az.to_radians().sin();
                let dlat = (base_dlat + normal_deg.sample(&mut ctx.rng)).clamp(-radius, radius);
                let dlon = (base_dlon + normal_deg.sample(&mut ctx.rng)).clamp(-radius, radius);
                let ddepth = ((cell.depth - center.depth) + normal_depth.sample(&mut ctx.rng))
                    .clamp(-depth_radius, depth_radius);
                generation.push(evaluate(center, dt, dlat, dlon, ddepth, obs, tables, ctx, cfg));
            }
        }
        all.extend(generation);
    }

    all.sort_by(|a, b| a.misfit.partial_cmp(&b.misfit).unwrap());
    let best = all.first().copied().unwrap_or(NaSample {
        origin_time: center.origin_time,
        lat: center.lat,
        lon: center.lon,
        depth: center.depth,
        misfit: f64::INFINITY,
    });

    NaResult { best, samples: if keep_samples { all } else { Vec::new() } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Defining;

    fn flat_table(phase: &str) -> crate::tables::TtTable {
        crate::tables::TtTable {
            phase: phase.to_string(),
            distances: vec![0.0, 45.0, 90.0],
            depths: vec![0.0, 100.0, 200.0],
            ttime: vec![vec![10.0, 20.0, 30.0]; 3],
            dtdd: vec![vec![0.1; 3]; 3],
            dtdh: vec![vec![0.01; 3]; 3],
            bounce_delta: None,
        }
    }

    fn tables_with(phase: &str) -> Tables {
        let mut tt = crate::tables::TtTableSet::new();
        tt.insert(flat_table(phase));
        let topography = crate::tables::TopographyGrid::from_bytes(&[0, 0], 1, 1, 1.0, 0.0, 0.0).unwrap();
        let region_depth = crate::tables::RegionDepthGrid::from_bytes(&[0, 0, 0, 0], 1, 1, 1.0, 0.0, 0.0).unwrap();
        Tables {
            travel_time: tt,
            ellipticity: crate::tables::EllipticityTableSet::new(),
            topography,
            region_depth,
            magnitude_q: std::collections::HashMap::new(),
            variogram: crate::tables::Variogram { max_separation_km: 100.0, nugget: 0.1, sill: 1.0, samples: vec![] },
            stations: std::collections::HashMap::new(),
        }
    }

    fn obs(time: f64) -> Obs {
        Obs {
            station: "AAA".into(),
            agency: "ISC".into(),
            sta_lat: 0.0,
            sta_lon: 0.5,
            sta_elevation_m: 0.0,
            reported_phase: "Pn".into(),
            phase: "Pn".into(),
            time: Some(time),
            azimuth: None,
            slowness: None,
            deltim: 1.0,
            delaz: 5.0,
            delslo: 1.0,
            defining: Defining { time: true, azimuth: false, slowness: false },
            is_first_arrival: true,
            is_duplicate: false,
            delta: 0.5,
            esaz: 90.0,
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
    fn search_returns_a_finite_best_misfit() {
        let tables = tables_with("Pn");
        let obs = vec![obs(10.0)];
        let mut ctx = Context::new(42, None);
        let mut cfg = Config::teleseismic();
        cfg.na.initial_sample = 20;
        cfg.na.next_sample = 10;
        cfg.na.cells = 3;
        cfg.na.iter_max = 2;
        let center = Hypo::seed(0.0, 0.0, 0.0, 10.0);
        let result = search(&center, &obs, &tables, &mut ctx, &cfg, false);
        assert!(result.best.misfit.is_finite());
    }

    #[test]
    fn keep_samples_returns_full_history() {
        let tables = tables_with("Pn");
        let obs = vec![obs(10.0)];
        let mut ctx = Context::new(7, None);
        let mut cfg = Config::teleseismic();
        cfg.na.initial_sample = 10;
        cfg.na.next_sample = 5;
        cfg.na.cells = 2;
        cfg.na.iter_max = 1;
        let center = Hypo::seed(0.0, 0.0, 0.0, 10.0);
        let result = search(&center, &obs, &tables, &mut ctx, &cfg, true);
        assert!(!result.samples.is_empty());
    }
}
