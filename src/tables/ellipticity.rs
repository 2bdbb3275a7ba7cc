//! Ellipticity coefficient tables: per-phase distance/depth
//! nodes and the three Dziewonski-Gilbert coefficient grids (tau0, tau1,
//! tau2), tabulated at fixed depth nodes {0,100,200,300,500,700} km.
//! Looked up with bilinear interpolation rather than bicubic (as for TT
//! tables), because these grids are coarse.

use std::collections::HashMap;
use std::io::BufRead;

use crate::constants::ELLIPTICITY_DEPTH_NODES;
use crate::error::TableError;
use crate::numerics::{bilinear_interpolate, InterpolationError};

#[derive(Debug, Clone)]
pub struct EllipticityCoefficients {
    pub phase: String,
    pub distances: Vec<f64>,
    pub depths: Vec<f64>,
    pub tau0: Vec<Vec<f64>>,
    pub tau1: Vec<Vec<f64>>,
    pub tau2: Vec<Vec<f64>>,
}

impl EllipticityCoefficients {
    /// `(tau0, tau1, tau2)` at `(delta_deg, depth_km)`.
    pub fn lookup(&self, delta_deg: f64, depth_km: f64) -> Result<(f64, f64, f64), InterpolationError> {
        let tau0 = bilinear_interpolate(&self.distances, &self.depths, &self.tau0, delta_deg, depth_km)?;
        let tau1 = bilinear_interpolate(&self.distances, &self.depths, &self.tau1, delta_deg, depth_km)?;
        let tau2 = bilinear_interpolate(&self.distances, &self.depths, &self.tau2, delta_deg, depth_km)?;
        Ok((tau0, tau1, tau2))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EllipticityTableSet {
    tables: HashMap<String, EllipticityCoefficients>,
}

impl EllipticityTableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coeffs: EllipticityCoefficients) {
        self.tables.insert(coeffs.phase.clone(), coeffs);
    }

    pub fn get(&self, phase: &str) -> Option<&EllipticityCoefficients> {
        self.tables.get(phase)
    }

    /// Reads one phase block: a header `phase ndist`, a line of `ndist`
    /// distance nodes, then three `ndist`-row matrices (tau0, tau1, tau2)
    /// each with one column per fixed depth node
    /// ([`ELLIPTICITY_DEPTH_NODES`]).
    pub fn load_phase_block(
        reader: impl BufRead,
        path: &str,
    ) -> Result<EllipticityCoefficients, TableError> {
        let mut lines = reader.lines();
        let header = lines
            .next()
            .ok_or_else(|| parse_err(path, "unexpected end of file"))?
            .map_err(|e| TableError::CannotOpenFile { path: path.to_string(), source: e })?;
        let mut it = header.split_whitespace();
        let phase = it
            .next()
            .ok_or_else(|| parse_err(path, "missing phase name"))?
            .to_string();
        let ndist: usize = it
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| parse_err(path, "invalid ndist"))?;

        let distances = read_row(&mut lines, path, ndist)?;
        let depths = ELLIPTICITY_DEPTH_NODES.to_vec();
        let ndepth = depths.len();

        let tau0 = read_matrix(&mut lines, path, ndist, ndepth)?;
        let tau1 = read_matrix(&mut lines, path, ndist, ndepth)?;
        let tau2 = read_matrix(&mut lines, path, ndist, ndepth)?;

        Ok(EllipticityCoefficients {
            phase,
            distances,
            depths,
            tau0,
            tau1,
            tau2,
        })
    }
}

fn read_row(lines: &mut std::io::Lines<impl BufRead>, path: &str, n: usize) -> Result<Vec<f64>, TableError> {
    let line = lines
        .next()
        .ok_or_else(|| parse_err(path, "unexpected end of file"))?
        .map_err(|e| TableError::CannotOpenFile { path: path.to_string(), source: e })?;
    let values: Vec<f64> = line.split_whitespace().filter_map(|s| s.parse().ok()).collect();
    if values.len() != n {
        return Err(parse_err(path, &format!("expected {n} values, found {}", values.len())));
    }
    Ok(values)
}

fn read_matrix(
    lines: &mut std::io::Lines<impl BufRead>,
    path: &str,
    nrow: usize,
    ncol: usize,
) -> Result<Vec<Vec<f64>>, TableError> {
    (0..nrow).map(|_| read_row(lines, path, ncol)).collect()
}

fn parse_err(path: &str, reason: &str) -> TableError {
    TableError::Parse { table: path.to_string(), reason: reason.to_string() }
}
