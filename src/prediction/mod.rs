//! Travel-time prediction: selects a source table for one
//! observation — local TT, regional tomography, or the global phase table
//! with first-arriving crossover fallback — then layers the ellipticity,
//! elevation and bounce-point corrections on top of the raw lookup.

mod corrections;
mod tomography;

pub use corrections::{bounce_point_correction, elevation_correction, ellipticity_correction};
pub use tomography::{NoRegionalTomography, RegionalTomography, TomographyPrediction, REGIONAL_PHASES};

use crate::config::Config;
use crate::context::Context;
use crate::tables::{EllipticityTableSet, TtTableSet};

/// How a missing phase-specific table is handled at local/regional
/// crossover distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstArrivingPolicy {
    /// Only the phase's own table may be used; never substitute the
    /// composite first-arriving table.
    UseOnly,
    /// Retry the composite first-arriving P or S table on a miss.
    AllowFallback,
    /// Treat a miss as final; do not even attempt the phase's own local
    /// table search beyond what selection priority already tried.
    Forbid,
}

/// Which branch of the selection priority produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    LocalTable,
    LocalFirstArriving,
    RegionalTomography,
    GlobalTable,
    GlobalFirstArriving,
}

/// Why no prediction could be produced for an observation; not a fatal
/// per-event [`crate::error::Error`] — the caller demotes the observation
/// and continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMiss {
    /// Neither the phase's own table nor (if allowed) a first-arriving
    /// composite table covers this phase at all.
    NoTable,
    /// A table exists but `(delta_deg, depth_km)` falls outside its nodes.
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionOutput {
    pub ttime: f64,
    pub dtdd: f64,
    pub dtdh: f64,
    pub d2tdd2: Option<f64>,
    pub d2tdh2: Option<f64>,
    pub bounce_delta: Option<f64>,
    pub source: PredictionSource,
}

/// Everything about the requesting observation that table selection and
/// the post-lookup corrections need.
#[derive(Debug, Clone, Copy)]
pub struct PredictionRequest<'a> {
    pub phase: &'a str,
    pub event_lat: f64,
    pub event_lon: f64,
    pub event_depth_km: f64,
    pub delta_deg: f64,
    pub esaz_deg: f64,
    pub sta_elevation_m: f64,
    pub water_depth_m: Option<f64>,
}

fn is_crustal_direct_phase(phase: &str) -> bool {
    matches!(phase, "Pg" | "Sg" | "Pb" | "Sb" | "Lg")
}

fn first_arriving_index(phase: &str) -> Option<&'static str> {
    let first = phase.chars().find(|c| c.is_ascii_uppercase())?;
    match first {
        'P' => Some(crate::tables::FIRST_P_INDEX),
        'S' => Some(crate::tables::FIRST_S_INDEX),
        _ => None,
    }
}

/// Selects a source table per the configured priority order, looks it up, and
/// (unless the regional-tomography branch already returned an internally
/// corrected value) applies ellipticity, elevation, and bounce-point
/// corrections.
pub fn predict(
    req: &PredictionRequest,
    global: &TtTableSet,
    ellipticity: &EllipticityTableSet,
    ctx: &Context,
    cfg: &Config,
    with_second_derivatives: bool,
    policy: FirstArrivingPolicy,
) -> Result<PredictionOutput, PredictionMiss> {
    let tt = &cfg.travel_time;

    if tt.use_local_tt && req.delta_deg <= tt.max_local_tt_delta_deg {
        if let Some(local) = ctx.local_tables() {
            if let Some(table) = local.get(req.phase) {
                if let Ok(lookup) = table.lookup(req.delta_deg, req.event_depth_km, with_second_derivatives) {
                    return Ok(apply_corrections(req, lookup, PredictionSource::LocalTable, ellipticity, tt));
                }
            }
            if policy == FirstArrivingPolicy::AllowFallback {
                if let Some(key) = first_arriving_index(req.phase) {
                    if let Some(table) = local.get(key) {
                        if let Ok(lookup) = table.lookup(req.delta_deg, req.event_depth_km, with_second_derivatives) {
                            return Ok(apply_corrections(
                                req,
                                lookup,
                                PredictionSource::LocalFirstArriving,
                                ellipticity,
                                tt,
                            ));
                        }
                    }
                }
            }
        }
    }

    if tt.use_rstt {
        if let Some(tomography) = ctx.tomography {
            let qualifies = REGIONAL_PHASES.contains(&req.phase)
                && tomography.qualifies(req.phase, req.delta_deg, req.event_depth_km)
                && (!is_crustal_direct_phase(req.phase) || req.event_depth_km <= cfg.depth.conrad_km);
            if qualifies {
                if let Some(prediction) = tomography.predict(
                    req.phase,
                    req.event_lat,
                    req.event_lon,
                    req.event_depth_km,
                    req.event_lat,
                    req.event_lon,
                ) {
                    return Ok(PredictionOutput {
                        ttime: prediction.ttime,
                        dtdd: prediction.dtdd,
                        dtdh: prediction.dtdh.unwrap_or(0.0),
                        d2tdd2: None,
                        d2tdh2: None,
                        bounce_delta: None,
                        source: PredictionSource::RegionalTomography,
                    });
                }
            }
        }
    }

    if let Some(table) = global.get(req.phase) {
        match table.lookup(req.delta_deg, req.event_depth_km, with_second_derivatives) {
            Ok(lookup) => return Ok(apply_corrections(req, lookup, PredictionSource::GlobalTable, ellipticity, tt)),
            Err(_) if policy == FirstArrivingPolicy::Forbid => return Err(PredictionMiss::OutOfRange),
            Err(_) => {}
        }
    }

    if policy == FirstArrivingPolicy::AllowFallback {
        if let Some(key) = first_arriving_index(req.phase) {
            if let Some(table) = global.get(key) {
                if let Ok(lookup) = table.lookup(req.delta_deg, req.event_depth_km, with_second_derivatives) {
                    return Ok(apply_corrections(
                        req,
                        lookup,
                        PredictionSource::GlobalFirstArriving,
                        ellipticity,
                        tt,
                    ));
                }
            }
        }
    }

    if global.contains(req.phase) {
        Err(PredictionMiss::OutOfRange)
    } else {
        Err(PredictionMiss::NoTable)
    }
}

fn apply_corrections(
    req: &PredictionRequest,
    lookup: crate::tables::TtLookup,
    source: PredictionSource,
    ellipticity: &EllipticityTableSet,
    tt: &crate::config::TravelTimeConfig,
) -> PredictionOutput {
    let mut ttime = lookup.ttime;

    if let Some(ec) = ellipticity.get(req.phase) {
        match ellipticity_correction(ec, req.delta_deg, req.event_depth_km, req.event_lat, req.esaz_deg) {
            Ok(correction) => ttime += correction,
            Err(_) => log::debug!("no ellipticity correction for {} at delta={}", req.phase, req.delta_deg),
        }
    }

    let is_depth_phase = lookup.bounce_delta.is_some();
    ttime += if is_depth_phase {
        bounce_point_correction(
            req.phase,
            req.water_depth_m,
            req.sta_elevation_m,
            lookup.dtdd,
            tt.p_surface_velocity,
            tt.s_surface_velocity,
        )
    } else {
        elevation_correction(req.phase, req.sta_elevation_m, lookup.dtdd, tt.p_surface_velocity, tt.s_surface_velocity)
    };

    PredictionOutput {
        ttime,
        dtdd: lookup.dtdd,
        dtdh: lookup.dtdh,
        d2tdd2: lookup.d2tdd2,
        d2tdh2: lookup.d2tdh2,
        bounce_delta: lookup.bounce_delta,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{TtTable, TtTableSet};

    fn flat_table(phase: &str) -> TtTable {
        TtTable {
            phase: phase.to_string(),
            distances: vec![0.0, 45.0, 90.0],
            depths: vec![0.0, 100.0, 200.0],
            ttime: vec![vec![100.0; 3]; 3],
            dtdd: vec![vec![0.05; 3]; 3],
            dtdh: vec![vec![0.01; 3]; 3],
            bounce_delta: None,
        }
    }

    #[test]
    fn global_table_lookup_applies_elevation_correction() {
        let mut global = TtTableSet::new();
        global.insert(flat_table("Pn"));
        let ellipticity = EllipticityTableSet::new();
        let ctx = Context::new(1, None);
        let cfg = Config::teleseismic();

        let req = PredictionRequest {
            phase: "Pn",
            event_lat: 10.0,
            event_lon: 20.0,
            event_depth_km: 50.0,
            delta_deg: 45.0,
            esaz_deg: 90.0,
            sta_elevation_m: 1000.0,
            water_depth_m: None,
        };

        let out = predict(&req, &global, &ellipticity, &ctx, &cfg, false, FirstArrivingPolicy::UseOnly).unwrap();
        assert_eq!(out.source, PredictionSource::GlobalTable);
        assert!(out.ttime > 100.0);
    }

    #[test]
    fn missing_phase_without_fallback_is_no_table() {
        let global = TtTableSet::new();
        let ellipticity = EllipticityTableSet::new();
        let ctx = Context::new(1, None);
        let cfg = Config::teleseismic();

        let req = PredictionRequest {
            phase: "PKPdf",
            event_lat: 0.0,
            event_lon: 0.0,
            event_depth_km: 10.0,
            delta_deg: 140.0,
            esaz_deg: 0.0,
            sta_elevation_m: 0.0,
            water_depth_m: None,
        };

        let err = predict(&req, &global, &ellipticity, &ctx, &cfg, false, FirstArrivingPolicy::UseOnly).unwrap_err();
        assert_eq!(err, PredictionMiss::NoTable);
    }

    #[test]
    fn missing_phase_falls_back_to_first_arriving_p() {
        let mut global = TtTableSet::new();
        global.insert(flat_table(crate::tables::FIRST_P_INDEX));
        let ellipticity = EllipticityTableSet::new();
        let ctx = Context::new(1, None);
        let cfg = Config::teleseismic();

        let req = PredictionRequest {
            phase: "P",
            event_lat: 0.0,
            event_lon: 0.0,
            event_depth_km: 10.0,
            delta_deg: 45.0,
            esaz_deg: 0.0,
            sta_elevation_m: 0.0,
            water_depth_m: None,
        };

        let out = predict(&req, &global, &ellipticity, &ctx, &cfg, false, FirstArrivingPolicy::AllowFallback).unwrap();
        assert_eq!(out.source, PredictionSource::GlobalFirstArriving);
    }
}
