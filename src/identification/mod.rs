//! Phase identification & residual assembly: assigns an internal
//! phase label to each observation against a trial hypocenter, flags
//! first arrivals and duplicates, and recomputes time/azimuth/slowness
//! residuals, demoting observations whose residual exceeds its configured
//! sigma threshold.

mod alternates;
mod fake_depth;

pub use fake_depth::{materialize_fake_depth_phases, strip_fake_depth_phases, FAKE_P, FAKE_S};

use crate::config::Config;
use crate::context::Context;
use crate::geodesy::dist_azimuth;
use crate::model::{Defining, Obs, Reading, Sol};
use crate::prediction::{predict, FirstArrivingPolicy, PredictionRequest};
use crate::tables::Tables;

/// Outcome of one `residuals` pass: how many observations remain
/// defining, and which global indices were demoted this iteration (fed to
/// [`crate::covariance`]'s squeeze path when correlated errors are on).
#[derive(Debug, Clone, Default)]
pub struct ResidualSummary {
    pub ndef: usize,
    pub demoted: Vec<usize>,
    /// count of distinct phase names demoted this iteration.
    pub demoted_phase_names: usize,
}

/// Recomputes `delta`/`esaz`/`seaz` for every observation against `sol`'s
/// current epicenter. Step 2 of the inversion kernel calls this whenever
/// the trial epicenter moves.
pub fn update_geometry(sol: &Sol, obs: &mut [Obs]) {
    for o in obs.iter_mut() {
        let (delta, esaz, seaz) = dist_azimuth(sol.hypo.lat, sol.hypo.lon, o.sta_lat, o.sta_lon);
        o.delta = delta;
        o.esaz = esaz;
        o.seaz = seaz;
    }
}

/// Assigns an internal phase label to each reading by testing the
/// reported name and its configured alternates, choosing the
/// prediction closest in time within a per-phase window. Flags the
/// first-arriving P or S per reading. Does not touch amplitude-only
/// arrivals' defining flags (those are set by `residuals`).
pub fn identify(sol: &Sol, obs: &mut [Obs], tables: &Tables, ctx: &Context, cfg: &Config) {
    update_geometry(sol, obs);

    let readings = Reading::group(obs);
    for reading in readings {
        let slice = &mut obs[reading.start..reading.start + reading.count];
        for o in slice.iter_mut() {
            let candidates = alternates::candidates_for(&o.reported_phase, &cfg.taxonomy);
            let mut best: Option<(String, f64, f64)> = None; // (phase, predicted_time, |resid|)

            for candidate in &candidates {
                let req = PredictionRequest {
                    phase: candidate,
                    event_lat: sol.hypo.lat,
                    event_lon: sol.hypo.lon,
                    event_depth_km: sol.hypo.depth,
                    delta_deg: o.delta,
                    esaz_deg: o.esaz,
                    sta_elevation_m: o.sta_elevation_m,
                    water_depth_m: None,
                };
                if let Ok(prediction) = predict(
                    &req,
                    &tables.travel_time,
                    &tables.ellipticity,
                    ctx,
                    cfg,
                    false,
                    FirstArrivingPolicy::AllowFallback,
                ) {
                    let predicted_time = sol.hypo.origin_time + prediction.ttime;
                    if let Some(reported) = o.time {
                        let resid = (reported - predicted_time).abs();
                        let window = alternates::window_for(candidate);
                        if resid <= window {
                            let better = match &best {
                                None => true,
                                Some((_, _, best_resid)) => resid < *best_resid,
                            };
                            if better {
                                best = Some((candidate.clone(), predicted_time, resid));
                            }
                        }
                    } else if best.is_none() {
                        // amplitude-only pick with no time: accept the
                        // reported name as-is, just record a predicted time.
                        best = Some((candidate.clone(), predicted_time, f64::INFINITY));
                    }
                }
            }

            if let Some((phase, _predicted_time, _resid)) = best {
                o.phase = phase;
            } else {
                // unknown phase: preserve the reported label.
                o.phase = o.reported_phase.clone();
            }
        }

        mark_first_arrivals(slice);
    }

    mark_duplicates(obs, 1.0);
}

/// Flags the first-arriving P and the first-arriving S phase within one
/// reading (ties broken by array order).
fn mark_first_arrivals(reading: &mut [Obs]) {
    for o in reading.iter_mut() {
        o.is_first_arrival = false;
    }
    let mut first_p: Option<usize> = None;
    let mut first_s: Option<usize> = None;
    for (i, o) in reading.iter().enumerate() {
        let Some(t) = o.time else { continue };
        let is_p = o.phase.starts_with('P') || o.phase.starts_with('p');
        let is_s = o.phase.starts_with('S') || o.phase.starts_with('s');
        if is_p {
            if first_p.map(|j| t < reading[j].time.unwrap()).unwrap_or(true) {
                first_p = Some(i);
            }
        } else if is_s && first_s.map(|j| t < reading[j].time.unwrap()).unwrap_or(true) {
            first_s = Some(i);
        }
    }
    if let Some(i) = first_p {
        reading[i].is_first_arrival = true;
    }
    if let Some(i) = first_s {
        reading[i].is_first_arrival = true;
    }
}

/// Marks duplicates: two phases are duplicates iff same station, same
/// agency, and predicted arrival times within `window_s`; the later one
/// is dropped from defining.
pub fn mark_duplicates(obs: &mut [Obs], window_s: f64) {
    for o in obs.iter_mut() {
        o.is_duplicate = false;
    }
    let n = obs.len();
    for i in 0..n {
        if obs[i].is_duplicate {
            continue;
        }
        for j in (i + 1)..n {
            if obs[j].is_duplicate {
                continue;
            }
            if obs[i].station != obs[j].station || obs[i].agency != obs[j].agency {
                continue;
            }
            if obs[i].phase != obs[j].phase {
                continue;
            }
            let (Some(ti), Some(tj)) = (obs[i].time, obs[j].time) else { continue };
            if (ti - tj).abs() <= window_s {
                // the later one is dropped from defining.
                let later = if ti <= tj { j } else { i };
                obs[later].is_duplicate = true;
                obs[later].defining = Defining::default();
            }
        }
    }
}

/// Recomputes predictions and residuals for every currently-defining
/// observation. Observations whose |residual| exceeds
/// `SigmaThreshold * prior_error` for a given datum class are demoted
/// (for this iteration only) in that class; an observation is counted
/// defining overall if any class is still defining. Amplitude-only
/// phases never enter the defining set even when a time is present.
pub fn residuals(
    sol: &Sol,
    obs: &mut [Obs],
    tables: &Tables,
    ctx: &Context,
    cfg: &Config,
) -> ResidualSummary {
    update_geometry(sol, obs);

    let mut demoted = Vec::new();
    let mut demoted_phase_names = std::collections::HashSet::new();
    let mut ndef = 0usize;

    for (i, o) in obs.iter_mut().enumerate() {
        o.reset_prediction();

        if cfg.taxonomy.amplitude_only.iter().any(|p| p == &o.phase) {
            o.defining = Defining::default();
            continue;
        }

        let req = PredictionRequest {
            phase: &o.phase,
            event_lat: sol.hypo.lat,
            event_lon: sol.hypo.lon,
            event_depth_km: sol.hypo.depth,
            delta_deg: o.delta,
            esaz_deg: o.esaz,
            sta_elevation_m: o.sta_elevation_m,
            water_depth_m: None,
        };

        let prediction = match predict(
            &req,
            &tables.travel_time,
            &tables.ellipticity,
            ctx,
            cfg,
            true,
            FirstArrivingPolicy::AllowFallback,
        ) {
            Ok(p) => p,
            Err(_) => {
                // absent prediction: keep the association, drop the
                // defining flags for this iteration.
                o.defining = Defining::default();
                continue;
            }
        };

        o.predicted_ttime = Some(prediction.ttime);
        o.dtdd = Some(prediction.dtdd);
        o.dtdh = Some(prediction.dtdh);
        o.d2tdd2 = prediction.d2tdd2;
        o.d2tdh2 = prediction.d2tdh2;
        o.bounce_delta = prediction.bounce_delta;

        let mut still_defining = Defining::default();
        let was_defining = o.defining;

        if was_defining.time {
            if let Some(time) = o.time {
                let predicted = sol.hypo.origin_time + prediction.ttime;
                let resid = time - predicted;
                o.time_residual = Some(resid);
                let prior = o.deltim.max(1e-6);
                if resid.abs() <= cfg.travel_time.sigma_threshold * prior {
                    still_defining.time = true;
                } else {
                    demoted.push(i);
                    demoted_phase_names.insert(o.phase.clone());
                }
            }
        }

        if was_defining.azimuth {
            if let Some(az) = o.azimuth {
                let resid = angular_residual(az, o.esaz);
                o.azimuth_residual = Some(resid);
                let prior = o.delaz.max(1e-6);
                if resid.abs() <= cfg.travel_time.sigma_threshold * prior {
                    still_defining.azimuth = true;
                } else {
                    demoted.push(i);
                    demoted_phase_names.insert(o.phase.clone());
                }
            }
        }

        if was_defining.slowness {
            if let (Some(slow), Some(dtdd)) = (o.slowness, o.dtdd) {
                let resid = slow - dtdd;
                o.slowness_residual = Some(resid);
                let prior = o.delslo.max(1e-6);
                if resid.abs() <= cfg.travel_time.sigma_threshold * prior {
                    still_defining.slowness = true;
                } else {
                    demoted.push(i);
                    demoted_phase_names.insert(o.phase.clone());
                }
            }
        }

        o.defining = still_defining;
        if still_defining.any() {
            ndef += 1;
        }
    }

    ResidualSummary {
        ndef,
        demoted,
        demoted_phase_names: demoted_phase_names.len(),
    }
}

/// Shortest signed angular residual (deg) between a reported and a
/// predicted azimuth, wrapped into (-180, 180].
fn angular_residual(reported_deg: f64, predicted_deg: f64) -> f64 {
    let mut d = reported_deg - predicted_deg;
    while d > 180.0 {
        d -= 360.0;
    }
    while d <= -180.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station_obs(station: &str, phase: &str, time: f64) -> Obs {
        Obs {
            station: station.to_string(),
            agency: "ISC".to_string(),
            sta_lat: 0.0,
            sta_lon: 0.0,
            sta_elevation_m: 0.0,
            reported_phase: phase.to_string(),
            phase: phase.to_string(),
            time: Some(time),
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
    fn duplicate_within_window_is_dropped() {
        let mut obs = vec![station_obs("AAA", "P", 100.0), station_obs("AAA", "P", 100.3)];
        mark_duplicates(&mut obs, 1.0);
        assert!(obs[1].is_duplicate);
        assert!(!obs[1].defining.any());
        assert!(!obs[0].is_duplicate);
    }

    #[test]
    fn duplicate_outside_window_is_kept() {
        let mut obs = vec![station_obs("AAA", "P", 100.0), station_obs("AAA", "P", 200.0)];
        mark_duplicates(&mut obs, 1.0);
        assert!(!obs[0].is_duplicate && !obs[1].is_duplicate);
    }

    #[test]
    fn angular_residual_wraps_correctly() {
        assert!((angular_residual(5.0, 355.0) - 10.0).abs() < 1e-9);
        assert!((angular_residual(355.0, 5.0) + 10.0).abs() < 1e-9);
    }
}
