//! Travel-time table loading and lookup.

use std::collections::HashMap;
use std::io::BufRead;

use crate::error::TableError;
use crate::numerics::{bicubic_interpolate, InterpolationError};

/// Reserved index for the composite "first-arriving P" table: used only
/// across crossover distances, never as a renamed phase.
pub const FIRST_P_INDEX: &str = "__first_P";
/// Reserved index for the composite "first-arriving S" table.
pub const FIRST_S_INDEX: &str = "__first_S";

/// Per-phase travel-time table: monotone distance/depth node arrays, a
/// matrix of travel times, matrices of the two first-derivatives, and
/// (for depth phases) a bounce-point distance matrix. Negative entries
/// mark "no phase at that node".
#[derive(Debug, Clone)]
pub struct TtTable {
    pub phase: String,
    pub distances: Vec<f64>,
    pub depths: Vec<f64>,
    pub ttime: Vec<Vec<f64>>,
    pub dtdd: Vec<Vec<f64>>,
    pub dtdh: Vec<Vec<f64>>,
    pub bounce_delta: Option<Vec<Vec<f64>>>,
}

impl TtTable {
    pub fn is_depth_phase(&self) -> bool {
        self.bounce_delta.is_some()
    }

    /// Looks up travel time (and optionally its 2nd derivatives) at
    /// `(delta_deg, depth_km)` via bicubic interpolation; `dtdd`/`dtdh`
    /// are interpolated the same way over their own matrices.
    pub fn lookup(
        &self,
        delta_deg: f64,
        depth_km: f64,
        with_second_derivatives: bool,
    ) -> Result<TtLookup, InterpolationError> {
        let (ttime, d2tdd2_from_ttime) = bicubic_interpolate(
            &self.distances,
            &self.depths,
            &self.ttime,
            delta_deg,
            depth_km,
            with_second_derivatives,
        )?;
        let (dtdd, d2tdd2) = bicubic_interpolate(
            &self.distances,
            &self.depths,
            &self.dtdd,
            delta_deg,
            depth_km,
            with_second_derivatives,
        )?;
        let (dtdh, d2tdh2) = bicubic_interpolate(
            &self.distances,
            &self.depths,
            &self.dtdh,
            delta_deg,
            depth_km,
            with_second_derivatives,
        )?;
        let _ = d2tdd2_from_ttime;

        let bounce_delta = match &self.bounce_delta {
            Some(table) => {
                let (bp, _) =
                    bicubic_interpolate(&self.distances, &self.depths, table, delta_deg, depth_km, false)?;
                Some(bp)
            }
            None => None,
        };

        Ok(TtLookup {
            ttime,
            dtdd,
            dtdh,
            d2tdd2,
            d2tdh2,
            bounce_delta,
        })
    }

    /// Exact value at a table node, used by the "node coincidence"
    /// testable property.
    pub fn node_value(&self, delta_idx: usize, depth_idx: usize) -> f64 {
        self.ttime[delta_idx][depth_idx]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TtLookup {
    pub ttime: f64,
    pub dtdd: f64,
    pub dtdh: f64,
    pub d2tdd2: Option<f64>,
    pub d2tdh2: Option<f64>,
    pub bounce_delta: Option<f64>,
}

/// The full set of global phase tables, keyed by phase name, with the two
/// reserved composite entries at [`FIRST_P_INDEX`]/[`FIRST_S_INDEX`].
#[derive(Debug, Clone, Default)]
pub struct TtTableSet {
    tables: HashMap<String, TtTable>,
}

impl TtTableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: TtTable) {
        self.tables.insert(table.phase.clone(), table);
    }

    pub fn get(&self, phase: &str) -> Option<&TtTable> {
        self.tables.get(phase)
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.tables.contains_key(phase)
    }

    pub fn first_p(&self) -> Option<&TtTable> {
        self.tables.get(FIRST_P_INDEX)
    }

    pub fn first_s(&self) -> Option<&TtTable> {
        self.tables.get(FIRST_S_INDEX)
    }

    /// Reads one phase's table from a simple text format: a header line
    /// `phase ndist ndepth is_depth_phase`, a line of `ndist` distance
    /// nodes, a line of `ndepth` depth nodes, then `ndist` rows of `ndepth`
    /// travel times, then the same shape again for dtdd, dtdh, and
    /// (if `is_depth_phase`) bounce-point distance.
    pub fn load_phase_table(reader: impl BufRead, path: &str) -> Result<TtTable, TableError> {
        let mut lines = reader.lines();
        let header = next_line(&mut lines, path)?;
        let mut it = header.split_whitespace();
        let phase = it
            .next()
            .ok_or_else(|| parse_err(path, "missing phase name in header"))?
            .to_string();
        let ndist: usize = parse_field(it.next(), path, "ndist")?;
        let ndepth: usize = parse_field(it.next(), path, "ndepth")?;
        let is_depth_phase: bool = it.next().map(|s| s == "1").unwrap_or(false);

        let distances = read_f64_row(&mut lines, path, ndist)?;
        let depths = read_f64_row(&mut lines, path, ndepth)?;
        let ttime = read_matrix(&mut lines, path, ndist, ndepth)?;
        let dtdd = read_matrix(&mut lines, path, ndist, ndepth)?;
        let dtdh = read_matrix(&mut lines, path, ndist, ndepth)?;
        let bounce_delta = if is_depth_phase {
            Some(read_matrix(&mut lines, path, ndist, ndepth)?)
        } else {
            None
        };

        Ok(TtTable {
            phase,
            distances,
            depths,
            ttime,
            dtdd,
            dtdh,
            bounce_delta,
        })
    }
}

fn next_line(lines: &mut std::io::Lines<impl BufRead>, path: &str) -> Result<String, TableError> {
    lines
        .next()
        .ok_or_else(|| parse_err(path, "unexpected end of file"))?
        .map_err(|e| TableError::CannotOpenFile { path: path.to_string(), source: e })
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    path: &str,
    name: &str,
) -> Result<T, TableError> {
    field
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| parse_err(path, &format!("invalid {name}")))
}

fn read_f64_row(
    lines: &mut std::io::Lines<impl BufRead>,
    path: &str,
    n: usize,
) -> Result<Vec<f64>, TableError> {
    let line = next_line(lines, path)?;
    let values: Vec<f64> = line
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();
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
    (0..nrow).map(|_| read_f64_row(lines, path, ncol)).collect()
}

fn parse_err(path: &str, reason: &str) -> TableError {
    TableError::Parse {
        table: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_text() -> &'static str {
        "P 3 3 0\n\
         0 10 20\n\
         0 100 200\n\
         1.0 2.0 3.0\n\
         3.0 4.0 5.0\n\
         5.0 6.0 7.0\n\
         0.1 0.1 0.1\n\
         0.1 0.1 0.1\n\
         0.1 0.1 0.1\n\
         -0.01 -0.01 -0.01\n\
         -0.01 -0.01 -0.01\n\
         -0.01 -0.01 -0.01\n"
    }

    #[test]
    fn loads_and_looks_up_node_value() {
        let table = TtTableSet::load_phase_table(Cursor::new(sample_text()), "test").unwrap();
        assert_eq!(table.phase, "P");
        assert_eq!(table.node_value(1, 0), 3.0);
        assert!(!table.is_depth_phase());
    }

    #[test]
    fn lookup_matches_node_exactly() {
        let table = TtTableSet::load_phase_table(Cursor::new(sample_text()), "test").unwrap();
        let got = table.lookup(10.0, 100.0, false).unwrap();
        assert!((got.ttime - 4.0).abs() < 1e-9);
    }
}
