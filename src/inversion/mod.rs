//! Linearised SVD inversion kernel: the per-event iteration loop
//! that takes a trial [`Sol`] from [`crate::identification`]'s residuals to
//! convergence, divergence, or a terminal [`Error`].

mod step;

use nalgebra::{DMatrix, DVector};

use crate::config::Config;
use crate::constants::{
    COND_BAND_HIGH, COND_BAND_LOW, COND_BAND_MID, COND_ILL_CONDITIONED, DAMPING_HIGH, DAMPING_LOW,
    DAMPING_MID, DEG2KM, DEG2RAD, EARTH_RADIUS_KM, MODEL_NORM_SCALE_LIMIT, RAD2DEG,
};
use crate::context::Context;
use crate::covariance::{DataCovariance, Projection};
use crate::diagnostics::{Diagnostics, IterationLog};
use crate::error::Error;
use crate::geodesy::point_at_delta_azimuth;
use crate::identification::{identify, residuals, update_geometry};
use crate::model::{DepthFixType, Hypo, Obs, Sol};
use crate::numerics::SvdDecomposition;
use crate::rows::{defining_phase_set, defining_rows, DatumClass};
use crate::tables::Tables;

pub use step::StepHistory;

/// Which of (time, lat, lon, depth) are free this iteration, in that
/// fixed order. `depth_free_this_iteration` folds in the warmup freeze
/// (first `MinIterations-1` sweeps), the airquake/deepquake freeze for
/// the current sweep, and the option's own fixed-depth instruction.
fn free_mask(sol: &Sol, depth_free_this_iteration: bool) -> [bool; 4] {
    [!sol.hypo.fix.time, !sol.hypo.fix.epicenter, !sol.hypo.fix.epicenter, depth_free_this_iteration]
}

fn adaptive_damping(cond: f64) -> f64 {
    if cond > COND_BAND_HIGH {
        DAMPING_HIGH
    } else if cond > COND_BAND_MID {
        DAMPING_MID
    } else if cond > COND_BAND_LOW {
        DAMPING_LOW
    } else {
        0.0
    }
}

/// Builds the un-whitened G (rows per [`defining_rows`], columns per the
/// free subset of (t, lat, lon, depth)) and d (observed minus predicted).
fn build_g_d(obs: &[Obs], sol: &Sol, mask: [bool; 4]) -> (DMatrix<f64>, DVector<f64>, Vec<(usize, DatumClass)>) {
    let rows = defining_rows(obs);
    let n = rows.len();
    let m = mask.iter().filter(|f| **f).count().max(1);
    let mut g = DMatrix::<f64>::zeros(n, m);
    let mut d = DVector::<f64>::zeros(n);

    let r_minus_z = (EARTH_RADIUS_KM - sol.hypo.depth).max(1.0);

    for (row, &(oi, class)) in rows.iter().enumerate() {
        let o = &obs[oi];
        let esaz_rad = o.esaz * DEG2RAD;
        let delta_rad = o.delta * DEG2RAD;
        let sin_delta = delta_rad.sin().abs().max(1e-4);

        let mut cols = [0.0f64; 4];
        match class {
            DatumClass::Time => {
                let dtdd = o.dtdd.unwrap_or(0.0);
                let dtdh = o.dtdh.unwrap_or(0.0);
                cols[0] = 1.0;
                cols[1] = -(dtdd / r_minus_z) * esaz_rad.sin() * DEG2RAD.recip();
                cols[2] = -(dtdd / r_minus_z) * esaz_rad.cos() * DEG2RAD.recip();
                cols[3] = -dtdh;
                d[row] = o.time_residual.unwrap_or(0.0);
            }
            DatumClass::Azimuth => {
                cols[1] = -esaz_rad.cos() / (EARTH_RADIUS_KM * sin_delta);
                cols[2] = esaz_rad.sin() / (EARTH_RADIUS_KM * sin_delta);
                d[row] = o.azimuth_residual.unwrap_or(0.0);
            }
            DatumClass::Slowness => {
                let d2tdd2 = o.d2tdd2.unwrap_or(0.0);
                let d2tdh2 = o.d2tdh2.unwrap_or(0.0);
                cols[1] = -(d2tdd2 / r_minus_z) * esaz_rad.sin();
                cols[2] = -(d2tdd2 / r_minus_z) * esaz_rad.cos();
                cols[3] = -d2tdh2;
                d[row] = o.slowness_residual.unwrap_or(0.0) / DEG2KM;
            }
        }

        let mut c = 0;
        for (k, &free) in mask.iter().enumerate() {
            if free {
                g[(row, c)] = cols[k];
                c += 1;
            }
        }
    }

    (g, d, rows)
}

/// Whitens (G, d) either via the correlated-error projection matrix or,
/// when correlated errors are disabled, a diagonal 1/sigma weighting.
fn whiten(
    g: DMatrix<f64>,
    d: DVector<f64>,
    rows: &[(usize, DatumClass)],
    obs: &[Obs],
    cfg: &Config,
    tables: &Tables,
) -> (DMatrix<f64>, DVector<f64>, Option<Projection>) {
    if cfg.correlated_errors.enabled {
        let cov = DataCovariance::build(obs, &tables.variogram);
        let proj = Projection::from_covariance(&cov, cfg.correlated_errors.projection_confidence);
        let gw = &proj.w * &g;
        let dw = &proj.w * &d;
        (gw, dw, Some(proj))
    } else {
        let mut gw = g;
        let mut dw = d;
        for (i, &(oi, class)) in rows.iter().enumerate() {
            let o = &obs[oi];
            let sigma = match class {
                DatumClass::Time => o.deltim,
                DatumClass::Azimuth => o.delaz,
                DatumClass::Slowness => o.delslo,
            };
            let weight = if sigma > 0.0 { 1.0 / sigma } else { 1.0 };
            for c in 0..gw.ncols() {
                gw[(i, c)] *= weight;
            }
            dw[i] *= weight;
        }
        (gw, dw, None)
    }
}

/// Scatters a free-parameter step vector back into (dt, dlat, dlon, ddepth).
fn scatter_step(step: &DVector<f64>, mask: [bool; 4]) -> [f64; 4] {
    let mut out = [0.0f64; 4];
    let mut c = 0;
    for (k, &free) in mask.iter().enumerate() {
        if free {
            out[k] = step[c];
            c += 1;
        }
    }
    out
}

/// Applies the scattered step to (time, epicenter, depth). `step[1]`/
/// `step[2]` are the east/north components solved against the
/// `sin(esaz)`/`cos(esaz)` columns of `build_g_d`; projected to degrees via
/// `delta = RAD2DEG * sqrt(east^2+north^2) / r_minus_z` and
/// `az = atan2(east, north)`, matching the original's `BuildGd`/step-update
/// pair. Depth is left unclamped: out-of-band excursions are caught and
/// snapped by the airquake/deepquake check at the top of the *next*
/// iteration, not here — clamping immediately would hide repeated
/// excursions from the airquake/deepquake counters (see `invert`'s
/// iteration loop).
fn apply_step(sol: &mut Sol, step: [f64; 4], r_minus_z: f64) {
    sol.hypo.origin_time += step[0];

    let east = step[1];
    let north = step[2];
    let epi_step_deg = RAD2DEG * (east * east + north * north).sqrt() / r_minus_z;
    if epi_step_deg > 1e-9 {
        let az = east.atan2(north).to_degrees();
        let az = if az < 0.0 { az + 360.0 } else { az };
        let (lat, lon) = point_at_delta_azimuth(sol.hypo.lat, sol.hypo.lon, epi_step_deg, az);
        sol.hypo.lat = lat;
        sol.hypo.lon = lon;
    }

    sol.hypo.depth += step[3];
}

/// Warmup-freezes depth for the first `MinIterations-1` sweeps, then clamps
/// `sol.hypo.depth` into `[0, max_hypocenter_depth]` whenever the previous
/// sweep pushed it out of band, counting airquakes (negative) and
/// deepquakes (over-max) separately; once either counter exceeds 2, depth
/// is frozen for the rest of this option and `sol.depth_fix` becomes
/// [`DepthFixType::Beyond`]. Returns whether depth is free this sweep.
fn depth_freeze_step(
    sol: &mut Sol,
    cfg: &Config,
    iteration: usize,
    nairquakes: &mut usize,
    ndeepquakes: &mut usize,
) -> bool {
    let mut depth_free = !sol.hypo.fix.depth && matches!(sol.depth_fix, DepthFixType::Free);
    if !depth_free {
        return false;
    }

    if iteration + 1 < cfg.iteration.min_iterations {
        depth_free = false;
    } else if sol.hypo.depth < 0.0 {
        sol.hypo.depth = 0.0;
        *nairquakes += 1;
        depth_free = false;
    } else if sol.hypo.depth > cfg.depth.max_hypocenter_depth {
        sol.hypo.depth = cfg.depth.max_hypocenter_depth;
        *ndeepquakes += 1;
        depth_free = false;
    }

    if *nairquakes > 2 || *ndeepquakes > 2 {
        sol.depth_fix = DepthFixType::Beyond;
        depth_free = false;
    }

    depth_free
}

/// Runs the iteration loop to convergence or a terminal [`Error`],
/// mutating `sol` and `obs` in place and appending one [`IterationLog`]
/// per iteration to `diag`.
pub fn invert(
    sol: &mut Sol,
    obs: &mut [Obs],
    tables: &Tables,
    ctx: &mut Context,
    cfg: &Config,
    diag: &mut Diagnostics,
) -> Result<(), Error> {
    let mut history = StepHistory::default();
    let mut nairquakes = 0usize;
    let mut ndeepquakes = 0usize;
    let mut last_phase_set = defining_phase_set(obs);

    for iteration in 0..cfg.iteration.max_iterations {
        // step 1: warmup freeze, then airquake/deepquake clamp/count, then
        // permanent freeze once either counter exceeds 2.
        let depth_free_this_iteration =
            depth_freeze_step(sol, cfg, iteration, &mut nairquakes, &mut ndeepquakes);

        // step 2: geometry + Moho/Conrad crossover reidentify.
        update_geometry(sol, obs);
        let crossed_moho = (sol.hypo.depth - cfg.depth.moho_km).abs() < 1.0
            || (sol.hypo.depth - cfg.depth.conrad_km).abs() < 1.0;
        if crossed_moho || iteration == 0 {
            identify(sol, obs, tables, ctx, cfg);
        }

        // step 3: residuals; abort if not enough defining phases remain.
        let summary = residuals(sol, obs, tables, ctx, cfg);
        diag.demoted_phases.extend(
            summary.demoted.iter().map(|&i| (i, obs[i].phase.clone())),
        );
        sol.ndef = summary.ndef;
        if summary.ndef <= sol.num_unknowns {
            return Err(Error::InsufficientPhases { ndef: summary.ndef, unknowns: sol.num_unknowns });
        }

        let phase_set = defining_phase_set(obs);
        if phase_set != last_phase_set {
            history.reset();
        }
        last_phase_set = phase_set;

        // steps 4-6: build, whiten.
        let mask = free_mask(sol, depth_free_this_iteration);
        sol.num_unknowns = mask.iter().filter(|f| **f).count();
        let r_minus_z = (EARTH_RADIUS_KM - sol.hypo.depth).max(1.0);
        let (g, d, rows) = build_g_d(obs, sol, mask);
        let (gw, dw, _proj) = whiten(g, d, &rows, obs, cfg, tables);

        // step 7: SVD + adaptive damping.
        let svd = SvdDecomposition::decompose(&gw).map_err(|_| Error::SingularNormalEquations {
            rank: 0,
            unknowns: sol.num_unknowns,
        })?;
        let threshold = svd.threshold(gw.nrows(), gw.ncols());
        let rank = svd.rank(threshold);
        if rank < sol.num_unknowns {
            return Err(Error::SingularNormalEquations { rank, unknowns: sol.num_unknowns });
        }
        let cond = svd.condition_number(threshold);
        if cond > COND_ILL_CONDITIONED {
            return Err(Error::IllConditioned { cond });
        }
        let damping = if cfg.correlated_errors.allow_damping { adaptive_damping(cond) } else { 0.0 };
        let damped_sv = svd.sv.map(|s| (s * s + damping * damping).sqrt());

        // step 8: solve.
        let mut m = svd.solve(&dw, &damped_sv, threshold);
        let norm = m.norm();
        if norm > MODEL_NORM_SCALE_LIMIT {
            m.scale_mut(MODEL_NORM_SCALE_LIMIT / norm);
        }

        // step 9: Paige-Saunders convergence statistic and step control.
        let cvg = step::paige_saunders(&gw, &dw, &m);
        let step_norm = m.norm();
        history.push(step_norm, cvg);

        sol.weighted_rms = (dw.norm_squared() / (dw.len().max(1) as f64)).sqrt();

        let scattered = scatter_step(&m, mask);
        apply_step(sol, scattered, r_minus_z);

        diag.iterations.push(IterationLog {
            iteration,
            ndef: summary.ndef,
            num_unknowns: sol.num_unknowns,
            rank,
            condition_number: cond,
            damping,
            step_norm,
            convergence_stat: cvg,
            origin_time: sol.hypo.origin_time,
            lat: sol.hypo.lat,
            lon: sol.hypo.lon,
            depth: sol.hypo.depth,
            weighted_rms: sol.weighted_rms,
        });

        if iteration + 1 >= cfg.iteration.min_iterations {
            if history.is_diverging() {
                sol.diverging = true;
                return Err(Error::Divergent { iterations: iteration + 1 });
            }
            if cvg < cfg.convergence.cvg_tol && step_norm < 1.0 {
                sol.converged = true;
                sol.rank = rank;
                finalize_covariance(sol, &svd, threshold, cfg, mask);
                return Ok(());
            }
            if iteration + 1 > cfg.iteration.min_iterations + 2 && history.step_halving_stalled() {
                sol.converged = true;
                sol.rank = rank;
                finalize_covariance(sol, &svd, threshold, cfg, mask);
                return Ok(());
            }
        }

        if iteration + 1 == cfg.iteration.max_iterations {
            sol.rank = rank;
            finalize_covariance(sol, &svd, threshold, cfg, mask);
            return Err(Error::MaxIterationsReached { max_iterations: cfg.iteration.max_iterations });
        }
    }

    Err(Error::MaxIterationsReached { max_iterations: cfg.iteration.max_iterations })
}

/// Step 11: scaled model covariance from the **undamped** spectrum, mapped
/// back into the full 4x4 (t, lat, lon, depth) layout with zero rows/cols
/// for fixed parameters, then the marginal sigmas read off its diagonal.
fn finalize_covariance(sol: &mut Sol, svd: &SvdDecomposition, threshold: f64, cfg: &Config, mask: [bool; 4]) {
    let chi_sq_scale = chi_square_scale(sol.num_unknowns, cfg.correlated_errors.confidence_level);
    let reduced = svd.model_covariance(threshold, chi_sq_scale);

    let mut full = [[0.0f64; 4]; 4];
    let mut ri = 0;
    for (i, &fi) in mask.iter().enumerate() {
        if !fi {
            continue;
        }
        let mut rj = 0;
        for (j, &fj) in mask.iter().enumerate() {
            if !fj {
                continue;
            }
            full[i][j] = reduced[(ri, rj)];
            rj += 1;
        }
        ri += 1;
    }
    sol.model_covariance = full;
    sol.sigma_time = full[0][0].max(0.0).sqrt();
    sol.sigma_lat = full[1][1].max(0.0).sqrt();
    sol.sigma_lon = full[2][2].max(0.0).sqrt();
    sol.sigma_depth = full[3][3].max(0.0).sqrt();
}

/// Chi-square scale factor for a `confidence_level` (%) ellipse with
/// `dof` degrees of freedom, via a short table for the common cases the
/// locator actually sees (1..=4 free parameters) rather than pulling in a
/// full inverse-chi-square crate for four fixed values.
fn chi_square_scale(dof: usize, confidence_level: f64) -> f64 {
    let dof = dof.clamp(1, 4);
    let at_68 = [1.0, 2.30, 3.53, 4.72][dof - 1];
    let at_90 = [2.71, 4.61, 6.25, 7.78][dof - 1];
    let at_95 = [3.84, 5.99, 7.81, 9.49][dof - 1];
    if confidence_level >= 95.0 {
        at_95
    } else if confidence_level >= 90.0 {
        at_90
    } else {
        at_68
    }
}
