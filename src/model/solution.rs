#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::hypo::{FixFlags, Hypo};

/// Why depth is currently held fixed (or free) for this solution.
///
/// The original program reuses a single integer code (6) for both "fixed
/// to the median of reported depths" and "option 1 with no default-depth
/// grid point available", disambiguated only by a secondary boolean. This
/// is preserved here as one variant carrying that boolean rather than two
/// separate codes (see design notes, open question on depth-fix-type 6).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DepthFixType {
    Free,
    DefaultDepth,
    UserDepth,
    MedianOrNoGridPoint { is_default_depth_grid: bool },
    FixedEpicenter,
    /// depth was frozen after repeated airquake/deepquake clamping.
    Beyond,
}

/// The working and final hypocenter: all [`Hypo`] fields plus
/// convergence bookkeeping, unknown count, depth-fix reason, model
/// covariance and derived uncertainties. Owned by the locator driver;
/// lifetime is one event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sol {
    pub hypo: Hypo,
    pub converged: bool,
    pub diverging: bool,
    /// number of free unknowns this iteration, 1..=4.
    pub num_unknowns: usize,
    pub depth_fix: DepthFixType,

    /// 4x4 model covariance in (t, x, y, z) order; zero rows/cols for
    /// parameters that were fixed.
    pub model_covariance: [[f64; 4]; 4],

    pub sigma_time: f64,
    pub sigma_lat: f64,
    pub sigma_lon: f64,
    pub sigma_depth: f64,

    pub weighted_rms: f64,
    pub unweighted_rms: f64,

    /// rank of the normal-equations matrix after projection.
    pub rank: usize,

    pub ndef: usize,
    pub nsta: usize,
}

impl Sol {
    pub fn from_hypo(hypo: Hypo, num_unknowns: usize, depth_fix: DepthFixType) -> Self {
        Self {
            hypo,
            converged: false,
            diverging: false,
            num_unknowns,
            depth_fix,
            model_covariance: [[0.0; 4]; 4],
            sigma_time: 0.0,
            sigma_lat: 0.0,
            sigma_lon: 0.0,
            sigma_depth: 0.0,
            weighted_rms: 0.0,
            unweighted_rms: 0.0,
            rank: 0,
            ndef: 0,
            nsta: 0,
        }
    }

    pub fn fix_flags(&self) -> FixFlags {
        self.hypo.fix
    }
}
