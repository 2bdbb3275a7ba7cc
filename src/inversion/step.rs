//! Step-length control and the Paige-Saunders convergence statistic
//!: a 3-deep rolling history of step norms used to detect
//! monotone divergence and step-halving stalls.

use nalgebra::{DMatrix, DVector};

/// Paige-Saunders `cvg` statistic: the relative size of the residual
/// reduction this step would buy, `||G*m - d|| / ||d||`. Values near zero
/// indicate the step no longer meaningfully reduces the misfit.
pub fn paige_saunders(g: &DMatrix<f64>, d: &DVector<f64>, m: &DVector<f64>) -> f64 {
    let dnorm = d.norm();
    if dnorm < 1e-12 {
        return 0.0;
    }
    (g * m - d).norm() / dnorm
}

const HISTORY_DEPTH: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct StepHistory {
    step_norms: Vec<f64>,
    cvgs: Vec<f64>,
}

impl StepHistory {
    pub fn push(&mut self, step_norm: f64, cvg: f64) {
        self.step_norms.push(step_norm);
        self.cvgs.push(cvg);
        if self.step_norms.len() > HISTORY_DEPTH {
            self.step_norms.remove(0);
            self.cvgs.remove(0);
        }
    }

    /// Drops the history, used whenever the defining phase-name set
    /// changes and the previous steps are no longer comparable.
    pub fn reset(&mut self) {
        self.step_norms.clear();
        self.cvgs.clear();
    }

    /// `true` if the last [`HISTORY_DEPTH`] step norms are monotonically
    /// increasing, indicating the iteration is walking away from a
    /// solution rather than converging to one.
    pub fn is_diverging(&self) -> bool {
        if self.step_norms.len() < HISTORY_DEPTH {
            return false;
        }
        self.step_norms.windows(2).all(|w| w[1] > w[0] * 1.01)
    }

    /// `true` if the last [`HISTORY_DEPTH`] steps are oscillating in sign
    /// of change with shrinking magnitude (step-halving), a sign the
    /// kernel should stop and accept the current estimate rather than
    /// keep thrashing near the optimum.
    pub fn step_halving_stalled(&self) -> bool {
        if self.cvgs.len() < HISTORY_DEPTH {
            return false;
        }
        let deltas: Vec<f64> = self.cvgs.windows(2).map(|w| w[1] - w[0]).collect();
        deltas.windows(2).all(|w| w[0] * w[1] < 0.0) && self.cvgs.iter().all(|c| *c < 0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotone_increasing_steps_are_diverging() {
        let mut h = StepHistory::default();
        h.push(1.0, 0.5);
        h.push(2.0, 0.4);
        h.push(4.0, 0.3);
        assert!(h.is_diverging());
    }

    #[test]
    fn shrinking_steps_are_not_diverging() {
        let mut h = StepHistory::default();
        h.push(4.0, 0.5);
        h.push(2.0, 0.4);
        h.push(1.0, 0.3);
        assert!(!h.is_diverging());
    }

    #[test]
    fn reset_clears_history() {
        let mut h = StepHistory::default();
        h.push(1.0, 0.5);
        h.push(2.0, 0.4);
        h.reset();
        assert!(!h.is_diverging());
    }

    #[test]
    fn paige_saunders_is_zero_for_zero_residual_vector() {
        let g = DMatrix::<f64>::identity(2, 2);
        let d = DVector::<f64>::zeros(2);
        let m = DVector::from_row_slice(&[0.0, 0.0]);
        assert_eq!(paige_saunders(&g, &d, &m), 0.0);
    }
}
