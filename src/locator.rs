//! The per-event driver: seeds a trial hypocenter, walks the
//! option loop over depth-constraint strategies, and on convergence
//! attaches magnitudes and quality metrics. This is the crate's single
//! public entry point.

use crate::config::Config;
use crate::context::Context;
use crate::diagnostics::Diagnostics;
use crate::error::Error;
use crate::identification::{identify, materialize_fake_depth_phases, residuals, strip_fake_depth_phases};
use crate::inversion::invert;
use crate::magnitude::{network_magnitudes, reading_magnitudes, station_magnitudes};
use crate::model::{DepthFixType, FixFlags as HypoFixFlags, Hypo, NetworkMagnitude, Obs, Sol, StationMagnitude};
use crate::na;
use crate::numerics::median;
use crate::quality::{self, Quality};
use crate::tables::Tables;

pub use crate::model::Obs as EventObs;

/// Everything a host program supplies for one event: the reported
/// origins (for the median seed and any user-fixed depth), the phase
/// observations, and identifying metadata. Magnitude-only text blocks are
/// out of scope for this struct; amplitudes travel on [`Obs::amplitudes`].
#[derive(Debug, Clone)]
pub struct EventInput {
    pub event_id: String,
    pub preferred_origin_id: Option<String>,
    pub reported: Vec<Hypo>,
    pub obs: Vec<Obs>,
}

/// The converged solution plus every derived product.
#[derive(Debug, Clone)]
pub struct Solution {
    pub sol: Sol,
    pub obs: Vec<Obs>,
    pub station_magnitudes: Vec<StationMagnitude>,
    pub network_magnitudes: Vec<NetworkMagnitude>,
    pub quality: Quality,
}

/// One candidate in the option loop: which [`DepthFixType`] it represents
/// and which hypocenter fields it holds fixed while inverting.
struct Option_ {
    name: &'static str,
    depth_fix: DepthFixType,
    fix: HypoFixFlags,
    seed_depth: Option<f64>,
}

/// `true` if the defining set satisfies any of the depth-resolution
/// criteria: enough depth phases (from enough distinct agencies),
/// enough close stations, enough S-P pairs, or enough core phases.
fn depth_is_resolved(obs: &[Obs], cfg: &Config) -> bool {
    let r = &cfg.depth.resolution;

    let depth_phase_names = ["pP", "sP", "sS", "pS", "pwP"];
    let mut depth_phase_agencies = std::collections::HashSet::new();
    let mut depth_phase_count = 0usize;
    for o in obs.iter().filter(|o| o.defining.any()) {
        if depth_phase_names.contains(&o.phase.as_str()) {
            depth_phase_count += 1;
            depth_phase_agencies.insert(o.agency.clone());
        }
    }
    if depth_phase_count >= r.min_depth_phases && depth_phase_agencies.len() >= r.min_depth_phase_agencies {
        return true;
    }

    let local_stations: std::collections::HashSet<&str> = obs
        .iter()
        .filter(|o| o.defining.any() && o.delta < 1.0)
        .map(|o| o.station.as_str())
        .collect();
    if local_stations.len() >= r.min_local_stations {
        return true;
    }

    let mut sp_pairs = 0usize;
    let mut stations_with_p = std::collections::HashSet::new();
    let mut stations_with_s = std::collections::HashSet::new();
    for o in obs.iter().filter(|o| o.defining.time) {
        if o.phase.starts_with('P') {
            stations_with_p.insert(o.station.as_str());
        } else if o.phase.starts_with('S') {
            stations_with_s.insert(o.station.as_str());
        }
    }
    for s in &stations_with_p {
        if stations_with_s.contains(s) {
            sp_pairs += 1;
        }
    }
    if sp_pairs >= r.min_sp_pairs {
        return true;
    }

    let core_phases = ["PKPdf", "PKPbc", "PKPab", "PKP", "PcP", "ScS"];
    let core_count = obs
        .iter()
        .filter(|o| o.defining.any() && core_phases.contains(&o.phase.as_str()))
        .count();
    core_count >= r.min_core_phases
}

/// Builds the option-loop candidate list in priority order: free
/// depth first if resolvable, then the region default-depth grid, a
/// reporting agency's explicit depth, the median of reported depths, and
/// finally progressively more fixed fallbacks.
fn build_options(event: &EventInput, seed: &Hypo, obs: &[Obs], tables: &Tables, cfg: &Config) -> Vec<Option_> {
    let mut options = Vec::new();

    if depth_is_resolved(obs, cfg) {
        options.push(Option_ {
            name: "Free",
            depth_fix: DepthFixType::Free,
            fix: HypoFixFlags::default(),
            seed_depth: None,
        });
    }

    let grid_depth = tables.region_depth.depth_at(seed.lat, seed.lon);
    options.push(Option_ {
        name: "DefaultDepth",
        depth_fix: DepthFixType::DefaultDepth,
        fix: HypoFixFlags { time: false, epicenter: false, depth: true },
        seed_depth: Some(grid_depth.unwrap_or(cfg.depth.default_depth)),
    });

    if let Some(user) = event.reported.iter().find(|h| h.fix.depth) {
        options.push(Option_ {
            name: "UserDepth",
            depth_fix: DepthFixType::UserDepth,
            fix: HypoFixFlags { time: false, epicenter: false, depth: true },
            seed_depth: Some(user.depth),
        });
    }

    if !event.reported.is_empty() {
        let median_depth = median(&event.reported.iter().map(|h| h.depth).collect::<Vec<_>>());
        options.push(Option_ {
            name: "MedianDepth",
            depth_fix: DepthFixType::MedianOrNoGridPoint { is_default_depth_grid: grid_depth.is_none() },
            fix: HypoFixFlags { time: false, epicenter: false, depth: true },
            seed_depth: Some(median_depth),
        });
    }

    options.push(Option_ {
        name: "FixedEpi",
        depth_fix: DepthFixType::FixedEpicenter,
        fix: HypoFixFlags { time: false, epicenter: true, depth: false },
        seed_depth: None,
    });

    options.push(Option_ {
        name: "FixedEpiAndDepth",
        depth_fix: DepthFixType::FixedEpicenter,
        fix: HypoFixFlags { time: false, epicenter: true, depth: true },
        seed_depth: Some(cfg.depth.default_depth),
    });

    options.push(Option_ {
        name: "FixedAll",
        depth_fix: DepthFixType::FixedEpicenter,
        fix: HypoFixFlags { time: true, epicenter: true, depth: true },
        seed_depth: None,
    });

    options
}

/// Median-of-pairs depth estimate from depth phases (`depdp`): for each
/// station reporting both a first-arriving P/S
/// pick and a depth-phase pick, the observed minus predicted differential
/// time implies a depth correction via the two phases' `dtdh` difference;
/// `depdp` is the median of those per-station estimates and `depdp_error`
/// their MAD-derived scale.
fn compute_depdp(sol: &Sol, obs: &[Obs]) -> (Option<f64>, Option<f64>) {
    let depth_phase_names = ["pP", "sP", "sS", "pS"];
    let mut estimates = Vec::new();

    let mut stations: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for o in obs {
        stations.insert(&o.station);
    }

    for station in stations {
        let primary = obs
            .iter()
            .find(|o| o.station == station && o.is_first_arrival && o.predicted_ttime.is_some() && o.time.is_some());
        let Some(primary) = primary else { continue };

        for depth_phase in obs
            .iter()
            .filter(|o| o.station == station && depth_phase_names.contains(&o.phase.as_str()))
        {
            let (Some(dp_time), Some(dp_pred), Some(dp_dtdh), Some(p_dtdh)) =
                (depth_phase.time, depth_phase.predicted_ttime, depth_phase.dtdh, primary.dtdh)
            else {
                continue;
            };
            let observed_diff = dp_time - primary.time.unwrap();
            let predicted_diff = dp_pred - primary.predicted_ttime.unwrap();
            let sensitivity = dp_dtdh - p_dtdh;
            if sensitivity.abs() < 1e-6 {
                continue;
            }
            let correction = (observed_diff - predicted_diff) / sensitivity;
            estimates.push(sol.hypo.depth + correction);
        }
    }

    if estimates.is_empty() {
        return (None, None);
    }
    let d = median(&estimates);
    let deviations: Vec<f64> = estimates.iter().map(|e| (e - d).abs()).collect();
    let mad = median(&deviations) * crate::constants::MAD_TO_SIGMA;
    (Some(d), Some(mad))
}

/// `true` if a converged Free-depth solution's depth uncertainty exceeds
/// the configured shallow/deep error band, triggering a fallback
/// to the next option.
fn depth_error_too_large(sol: &Sol, cfg: &Config) -> bool {
    let band = if sol.hypo.depth < 100.0 { cfg.depth.max_shallow_depth_error } else { cfg.depth.max_deep_depth_error };
    sol.sigma_depth > band
}

/// Runs one event to a converged [`Solution`] or a terminal [`Error`]
///: seeds a trial hypocenter from the median of `event.reported`,
/// walks the option loop of depth-constraint strategies, and on success
/// attaches depth-phase depth, magnitudes and quality metrics.
pub fn locate(event: EventInput, tables: &Tables, cfg: &Config, diag: &mut Diagnostics) -> Result<Solution, Error> {
    let seed = Hypo::median_of(&event.reported)
        .unwrap_or_else(|| Hypo::seed(0.0, 0.0, 0.0, cfg.depth.default_depth));

    let mut obs = event.obs;
    let mut ctx = Context::new(cfg.na.iseed, None);

    let options = build_options(&event, &seed, &obs, tables, cfg);
    let mut last_err: Option<Error> = None;

    for option in options {
        let depth = option.seed_depth.unwrap_or(seed.depth);
        let mut hypo = Hypo::seed(seed.origin_time, seed.lat, seed.lon, depth);
        hypo.fix = option.fix;

        let num_unknowns = [!option.fix.time, !option.fix.epicenter, !option.fix.epicenter, !option.fix.depth]
            .iter()
            .filter(|free| **free)
            .count();

        let mut sol = Sol::from_hypo(hypo, num_unknowns, option.depth_fix);

        if matches!(option.depth_fix, DepthFixType::Free) && !depth_is_resolved(&obs, cfg) {
            last_err = Some(Error::NoDepthResolution);
            diag.record_option(option.name, "no depth resolution criteria satisfied");
            continue;
        }

        identify(&sol, &mut obs, tables, &ctx, cfg);

        if cfg.na.enabled && sol.num_unknowns > 0 {
            let na_result = na::search(&sol.hypo, &obs, tables, &mut ctx, cfg, false);
            if !option.fix.time {
                sol.hypo.origin_time = na_result.best.origin_time;
            }
            if !option.fix.epicenter {
                sol.hypo.lat = na_result.best.lat;
                sol.hypo.lon = na_result.best.lon;
            }
            if !option.fix.depth {
                sol.hypo.depth = na_result.best.depth;
            }
            identify(&sol, &mut obs, tables, &ctx, cfg);
        }

        if sol.num_unknowns == 0 {
            // FixedAll: no inversion, just one residual pass for stats.
            let summary = residuals(&sol, &mut obs, tables, &ctx, cfg);
            sol.ndef = summary.ndef;
            sol.converged = true;
            diag.record_option(option.name, "fixed-all, no inversion");
            return Ok(finish(sol, obs, tables, cfg));
        }

        match invert(&mut sol, &mut obs, tables, &mut ctx, cfg, diag) {
            Ok(()) => {
                if matches!(option.depth_fix, DepthFixType::Free) && depth_error_too_large(&sol, cfg) {
                    last_err = Some(Error::DepthErrorTooLarge { sigma_z: sol.sigma_depth });
                    diag.record_option(option.name, "converged but depth error too large");
                    continue;
                }
                diag.record_option(option.name, "converged");
                return Ok(finish(sol, obs, tables, cfg));
            }
            Err(e) => {
                diag.record_option(option.name, format!("failed: {e}"));
                if e.is_recoverable_by_option_loop() {
                    last_err = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    Err(last_err.unwrap_or(Error::NoDepthResolution))
}

/// Post-convergence finishing steps: fake-depth-phase
/// materialisation for display, `depdp`, magnitudes and quality.
fn finish(mut sol: Sol, mut obs: Vec<Obs>, tables: &Tables, cfg: &Config) -> Solution {
    let materialized = materialize_fake_depth_phases(&mut obs, tables);
    for o in obs.iter_mut() {
        if o.phase == crate::identification::FAKE_P || o.phase == crate::identification::FAKE_S {
            let req = crate::prediction::PredictionRequest {
                phase: &o.phase,
                event_lat: sol.hypo.lat,
                event_lon: sol.hypo.lon,
                event_depth_km: sol.hypo.depth,
                delta_deg: o.delta,
                esaz_deg: o.esaz,
                sta_elevation_m: o.sta_elevation_m,
                water_depth_m: None,
            };
            let ctx = Context::new(1, None);
            if let Ok(p) = crate::prediction::predict(
                &req,
                &tables.travel_time,
                &tables.ellipticity,
                &ctx,
                cfg,
                false,
                crate::prediction::FirstArrivingPolicy::AllowFallback,
            ) {
                o.predicted_ttime = Some(p.ttime);
                if let Some(t) = o.time {
                    o.time_residual = Some(t - (sol.hypo.origin_time + p.ttime));
                }
            }
        }
    }
    strip_fake_depth_phases(&mut obs, &materialized);

    let (depdp, depdp_error) = compute_depdp(&sol, &obs);
    sol.hypo.depdp = depdp;
    sol.hypo.depdp_error = depdp_error;

    let readings = reading_magnitudes(&obs, &sol, tables, cfg);
    let stations = station_magnitudes(&readings);
    let network = network_magnitudes(&stations, cfg);
    let q = quality::compute(&obs);

    Solution { sol, obs, station_magnitudes: stations, network_magnitudes: network, quality: q }
}
