#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_rank() -> i32 {
    0
}

/// Which hypocenter fields the reporting agency declared fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FixFlags {
    pub time: bool,
    pub epicenter: bool,
    pub depth: bool,
}

/// A reported hypocenter: origin time, epicenter, depth, plus the
/// bookkeeping fields a loader attaches (counts, error scalars, gaps,
/// distance range, agency/event-type labels, optional depth-phase depth).
///
/// Created by the (out-of-scope) bulletin/DB loader and mutated only when
/// the core reorders the reported list to compute the median-seed Hypo.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hypo {
    /// origin time, epoch seconds.
    pub origin_time: f64,
    pub lat: f64,
    pub lon: f64,
    /// depth, km.
    pub depth: f64,
    pub fix: FixFlags,

    pub nass: usize,
    pub ndef: usize,
    pub nsta: usize,
    pub ndefsta: usize,

    /// weighted RMS of the defining residuals.
    pub sdobs: f64,
    pub stime: f64,
    pub sdepth: f64,

    pub smajax: f64,
    pub sminax: f64,
    pub strike: f64,

    pub gap: f64,
    pub sgap: f64,

    pub mindist: f64,
    pub maxdist: f64,

    pub agency: String,
    pub event_type: String,

    pub depdp: Option<f64>,
    pub depdp_error: Option<f64>,

    #[cfg_attr(feature = "serde", serde(default = "default_rank"))]
    pub rank: i32,
}

impl Hypo {
    /// An un-estimated hypocenter seeded purely from a trial epicenter/time;
    /// all error/count fields start at zero and are filled in as the
    /// locator converges.
    pub fn seed(origin_time: f64, lat: f64, lon: f64, depth: f64) -> Self {
        Self {
            origin_time,
            lat,
            lon,
            depth,
            fix: FixFlags::default(),
            nass: 0,
            ndef: 0,
            nsta: 0,
            ndefsta: 0,
            sdobs: 0.0,
            stime: 0.0,
            sdepth: 0.0,
            smajax: 0.0,
            sminax: 0.0,
            strike: 0.0,
            gap: 0.0,
            sgap: 0.0,
            mindist: 0.0,
            maxdist: 0.0,
            agency: String::new(),
            event_type: String::new(),
            depdp: None,
            depdp_error: None,
            rank: default_rank(),
        }
    }

    /// The median-of-reported Hypo that seeds the initial trial: the
    /// component-wise median of origin time, lat, lon and depth across the
    /// reported list.
    pub fn median_of(reported: &[Hypo]) -> Option<Hypo> {
        if reported.is_empty() {
            return None;
        }
        let ot = crate::numerics::median(
            &reported.iter().map(|h| h.origin_time).collect::<Vec<_>>(),
        );
        let lat = crate::numerics::median(&reported.iter().map(|h| h.lat).collect::<Vec<_>>());
        let lon = crate::numerics::median(&reported.iter().map(|h| h.lon).collect::<Vec<_>>());
        let depth = crate::numerics::median(&reported.iter().map(|h| h.depth).collect::<Vec<_>>());
        Some(Hypo::seed(ot, lat, lon, depth))
    }
}
