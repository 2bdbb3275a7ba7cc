#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which datum classes of an observation currently enter the inversion.
/// Demoted independently per class by `residuals` when a residual
/// exceeds its sigma threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Defining {
    pub time: bool,
    pub azimuth: bool,
    pub slowness: bool,
}

impl Defining {
    pub fn any(&self) -> bool {
        self.time || self.azimuth || self.slowness
    }
}

/// One amplitude/period measurement attached to an [`Obs`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Amp {
    /// ground-motion amplitude, nanometres.
    pub amplitude: f64,
    /// dominant period, seconds.
    pub period: f64,
    /// component: 'Z', 'N', 'E', or '.' for unspecified/horizontal-composite.
    pub component: char,
    pub channel: String,
    pub snr: Option<f64>,
    pub mag_type: crate::model::MagnitudeType,
    pub station_magnitude: Option<f64>,
    pub defining: bool,
}

/// A reported phase pick, joined with station coordinates, carrying both
/// the as-reported and internally reidentified phase labels plus the
/// predicted travel time and its derivatives once `predict` has run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Obs {
    pub station: String,
    pub agency: String,
    pub sta_lat: f64,
    pub sta_lon: f64,
    pub sta_elevation_m: f64,

    pub reported_phase: String,
    pub phase: String,

    /// arrival time, epoch seconds, if reported.
    pub time: Option<f64>,
    pub azimuth: Option<f64>,
    pub slowness: Option<f64>,

    /// prior measurement errors.
    pub deltim: f64,
    pub delaz: f64,
    pub delslo: f64,

    pub defining: Defining,
    pub is_first_arrival: bool,
    pub is_duplicate: bool,

    /// event-to-station distance, degrees, recomputed each iteration.
    pub delta: f64,
    pub esaz: f64,
    pub seaz: f64,

    pub predicted_ttime: Option<f64>,
    pub dtdd: Option<f64>,
    pub dtdh: Option<f64>,
    pub d2tdd2: Option<f64>,
    pub d2tdh2: Option<f64>,
    pub bounce_delta: Option<f64>,
    pub tt_model: Option<String>,

    pub time_residual: Option<f64>,
    pub azimuth_residual: Option<f64>,
    pub slowness_residual: Option<f64>,

    /// row/column index of this observation in the data-covariance /
    /// projection matrices, or `None` when not yet assigned.
    pub covariance_index: Option<usize>,

    pub amplitudes: Vec<Amp>,
}

impl Obs {
    pub fn reset_prediction(&mut self) {
        self.predicted_ttime = None;
        self.dtdd = None;
        self.dtdh = None;
        self.d2tdd2 = None;
        self.d2tdh2 = None;
        self.bounce_delta = None;
        self.tt_model = None;
        self.time_residual = None;
        self.azimuth_residual = None;
        self.slowness_residual = None;
    }
}

/// A consecutive block of `Obs` sharing (station, agency, author),
/// rebuilt after each sort of the phase array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub start: usize,
    pub count: usize,
}

impl Reading {
    /// Groups `obs` (already sorted by station/agency) into contiguous
    /// readings.
    pub fn group(obs: &[Obs]) -> Vec<Reading> {
        let mut readings = Vec::new();
        let mut i = 0;
        while i < obs.len() {
            let mut j = i + 1;
            while j < obs.len() && obs[j].station == obs[i].station && obs[j].agency == obs[i].agency {
                j += 1;
            }
            readings.push(Reading { start: i, count: j - i });
            i = j;
        }
        readings
    }
}
