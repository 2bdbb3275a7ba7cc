//! SVD helpers: decomposition, threshold/rank/condition number,
//! damped solve, and scaled model covariance, built on `nalgebra`'s SVD.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SvdError {
    #[error("SVD failed to converge")]
    NoConvergence,
    #[error("rank {rank} below required unknown count {unknowns}")]
    RankDeficient { rank: usize, unknowns: usize },
}

/// A decomposed `g = u * diag(sv) * v^T`, `g` is N x M (N >= M).
pub struct SvdDecomposition {
    pub u: DMatrix<f64>,
    pub sv: DVector<f64>,
    pub v: DMatrix<f64>,
}

impl SvdDecomposition {
    pub fn decompose(g: &DMatrix<f64>) -> Result<Self, SvdError> {
        let svd = nalgebra::linalg::SVD::new(g.clone(), true, true);
        let u = svd.u.ok_or(SvdError::NoConvergence)?;
        let v_t = svd.v_t.ok_or(SvdError::NoConvergence)?;
        Ok(Self {
            u,
            sv: svd.singular_values,
            v: v_t.transpose(),
        })
    }

    /// `eps * max(sv) * sqrt(n + m)`, the numerical-rank threshold.
    pub fn threshold(&self, n: usize, m: usize) -> f64 {
        let max_sv = self.sv.max();
        f64::EPSILON * max_sv * ((n + m) as f64).sqrt()
    }

    /// Count of singular values above `threshold`.
    pub fn rank(&self, threshold: f64) -> usize {
        self.sv.iter().filter(|&&s| s > threshold).count()
    }

    /// squared Frobenius-equivalent norm of G restricted to singular values
    /// above `threshold`: sum of sv^2.
    pub fn norm_squared(&self, threshold: f64) -> f64 {
        self.sv.iter().filter(|&&s| s > threshold).map(|s| s * s).sum()
    }

    /// condition number: max(sv) / min(sv above threshold).
    pub fn condition_number(&self, threshold: f64) -> f64 {
        let max_sv = self.sv.max();
        let min_sv = self
            .sv
            .iter()
            .filter(|&&s| s > threshold)
            .cloned()
            .fold(f64::INFINITY, f64::min);
        if min_sv.is_finite() && min_sv > 0.0 {
            max_sv / min_sv
        } else {
            f64::INFINITY
        }
    }

    /// `y = V * diag(sv^-1) * U^T * d`, using possibly-damped singular
    /// values (`damped_sv`), while `self.sv` keeps the undamped spectrum
    /// for covariance computation.
    pub fn solve(&self, d: &DVector<f64>, damped_sv: &DVector<f64>, threshold: f64) -> DVector<f64> {
        let m = self.v.ncols();
        let utd = self.u.transpose() * d;
        let mut y = DVector::<f64>::zeros(m);
        for k in 0..m.min(damped_sv.len()) {
            if damped_sv[k] > threshold {
                y[k] = utd[k] / damped_sv[k];
            }
        }
        self.v.clone() * y
    }

    /// scaled model covariance `C = V * diag(sv^-2) * V^T * chi_sq_scale`,
    /// using the **undamped** spectrum.
    pub fn model_covariance(&self, threshold: f64, chi_sq_scale: f64) -> DMatrix<f64> {
        let m = self.v.ncols();
        let mut diag = DMatrix::<f64>::zeros(m, m);
        for k in 0..m.min(self.sv.len()) {
            if self.sv[k] > threshold {
                diag[(k, k)] = chi_sq_scale / (self.sv[k] * self.sv[k]);
            }
        }
        &self.v * diag * self.v.transpose()
    }
}
