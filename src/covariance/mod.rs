//! Correlated-error data covariance: builds a block-diagonal-ish
//! NxN covariance across the time/azimuth/slowness row blocks of
//! [`crate::rows::defining_rows`], with same-phase-name stations
//! correlated through the generic variogram, then derives a whitening
//! projection matrix from its eigendecomposition.

mod station_order;

pub use station_order::station_permutation;

use nalgebra::DMatrix;

use crate::geodesy::dist_azimuth;
use crate::model::Obs;
use crate::rows::{defining_rows, DatumClass};
use crate::tables::Variogram;

/// The NxN data covariance plus the row layout it was built against, so
/// callers can translate an observation index back to a Σ row/column.
#[derive(Debug, Clone)]
pub struct DataCovariance {
    pub sigma: DMatrix<f64>,
    pub rows: Vec<(usize, DatumClass)>,
}

fn prior_sigma(o: &Obs, class: DatumClass) -> f64 {
    match class {
        DatumClass::Time => o.deltim.max(1e-6),
        DatumClass::Azimuth => o.delaz.max(1e-6),
        DatumClass::Slowness => o.delslo.max(1e-6),
    }
}

/// station separation (km) on the mean-Earth sphere.
fn separation_km(a: &Obs, b: &Obs) -> f64 {
    let (delta_deg, _, _) = dist_azimuth(a.sta_lat, a.sta_lon, b.sta_lat, b.sta_lon);
    delta_deg * crate::constants::DEG2KM
}

impl DataCovariance {
    /// Builds Σ from the current defining set: within a block
    /// (time/azimuth/slowness), entry (i,j) for two observations sharing
    /// a phase name is `sill - gamma(separation)`; off-diagonal entries
    /// across blocks or phase names are zero. Diagonal carries the prior
    /// variance plus the modelled variance at zero separation.
    pub fn build(obs: &[Obs], variogram: &Variogram) -> Self {
        let rows = defining_rows(obs);
        let n = rows.len();
        let mut sigma = DMatrix::<f64>::zeros(n, n);

        for i in 0..n {
            let (oi, ci) = rows[i];
            let prior = prior_sigma(&obs[oi], ci);
            let modelled_zero = variogram.sill - variogram.gamma(0.0);
            sigma[(i, i)] = prior * prior + modelled_zero;

            for j in (i + 1)..n {
                let (oj, cj) = rows[j];
                if ci != cj || obs[oi].phase != obs[oj].phase {
                    continue;
                }
                let d = separation_km(&obs[oi], &obs[oj]);
                let cov = variogram.sill - variogram.gamma(d);
                sigma[(i, j)] = cov;
                sigma[(j, i)] = cov;
            }
        }

        Self { sigma, rows }
    }

    /// Removes the rows/columns belonging to `demoted_obs` (by original
    /// observation index) from Σ in place, keeping `self.rows` consistent
    /// — the squeeze-out path used when only the defining count shrinks
    ///.
    pub fn squeeze(&mut self, demoted_obs: &[usize]) {
        let keep: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, (oi, _))| !demoted_obs.contains(oi))
            .map(|(idx, _)| idx)
            .collect();

        if keep.len() == self.rows.len() {
            return;
        }

        let n = keep.len();
        let mut reduced = DMatrix::<f64>::zeros(n, n);
        for (ri, &i) in keep.iter().enumerate() {
            for (rj, &j) in keep.iter().enumerate() {
                reduced[(ri, rj)] = self.sigma[(i, j)];
            }
        }
        self.sigma = reduced;
        self.rows = keep.into_iter().map(|i| self.rows[i]).collect();
    }
}

/// Whitening projection matrix W: `W = Lambda^{-1/2} * Q^T`
/// restricted to the eigenvectors of Σ whose cumulative contribution
/// reaches `confidence` (default 0.95). Applied once on the left of
/// `(G, d)`.
#[derive(Debug, Clone)]
pub struct Projection {
    pub w: DMatrix<f64>,
    pub retained: usize,
}

impl Projection {
    pub fn from_covariance(cov: &DataCovariance, confidence: f64) -> Self {
        let eigen = nalgebra::linalg::SymmetricEigen::new(cov.sigma.clone());
        // nalgebra returns eigenvalues in no particular order; sort
        // descending so the cumulative-contribution cutoff is meaningful.
        let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].partial_cmp(&eigen.eigenvalues[a]).unwrap());

        let total: f64 = eigen.eigenvalues.iter().filter(|v| **v > 0.0).sum();
        let mut cumulative = 0.0;
        let mut retained_idx = Vec::new();
        for &k in &order {
            let ev = eigen.eigenvalues[k];
            if ev <= 0.0 {
                continue;
            }
            retained_idx.push(k);
            cumulative += ev;
            if total > 0.0 && cumulative / total >= confidence {
                break;
            }
        }

        let n = cov.sigma.nrows();
        let m = retained_idx.len().max(1);
        let mut w = DMatrix::<f64>::zeros(m, n);
        for (row, &k) in retained_idx.iter().enumerate() {
            let lambda = eigen.eigenvalues[k].max(1e-300);
            let scale = 1.0 / lambda.sqrt();
            for col in 0..n {
                w[(row, col)] = scale * eigen.eigenvectors[(col, k)];
            }
        }

        Self { w, retained: retained_idx.len() }
    }

    /// Removes the columns of W corresponding to `demoted_obs` (resolved
    /// through `rows`), renormalising nothing else — the cheap squeeze
    /// path used when the defining set shrinks without its phase-name set
    /// changing.
    pub fn squeeze(&mut self, rows: &[(usize, DatumClass)], demoted_obs: &[usize]) {
        let keep: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, (oi, _))| !demoted_obs.contains(oi))
            .map(|(idx, _)| idx)
            .collect();
        if keep.len() == self.w.ncols() {
            return;
        }
        let mut reduced = DMatrix::<f64>::zeros(self.w.nrows(), keep.len());
        for (col, &k) in keep.iter().enumerate() {
            reduced.set_column(col, &self.w.column(k));
        }
        self.w = reduced;
    }
}
