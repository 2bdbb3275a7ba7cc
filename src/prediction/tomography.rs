//! Regional-tomography abstraction: the engine consumes an
//! external regional velocity-model service through a narrow trait rather
//! than embedding any particular implementation (e.g. RSTT/SLBM).

/// A qualifying regional phase's tomography-corrected prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TomographyPrediction {
    pub ttime: f64,
    pub dtdd: f64,
    pub dtdh: Option<f64>,
    pub pick_error: f64,
    pub total_error: f64,
}

/// Phases eligible for the regional-tomography branch.
pub const REGIONAL_PHASES: &[&str] = &["Pn", "Sn", "Pg", "Sg", "Pb", "Sb", "Lg"];

/// External regional-tomography service. Implementations carry implicit
/// per-thread state; `reset` must be called
/// between events and the engine must not cross events across threads
/// while using it.
pub trait RegionalTomography: Send + Sync {
    /// `true` if `phase` at `(delta_deg, depth_km)` qualifies for a
    /// tomography-corrected prediction under the host's configuration.
    fn qualifies(&self, phase: &str, delta_deg: f64, depth_km: f64) -> bool;

    fn predict(
        &self,
        phase: &str,
        event_lat: f64,
        event_lon: f64,
        event_depth_km: f64,
        sta_lat: f64,
        sta_lon: f64,
    ) -> Option<TomographyPrediction>;

    /// Resets per-thread "current great circle" state between events.
    fn reset(&self);
}

/// Used when no regional-tomography service is linked in: always reports
/// "does not qualify", so the engine is fully usable without the external
/// library.
pub struct NoRegionalTomography;

impl RegionalTomography for NoRegionalTomography {
    fn qualifies(&self, _phase: &str, _delta_deg: f64, _depth_km: f64) -> bool {
        false
    }

    fn predict(
        &self,
        _phase: &str,
        _event_lat: f64,
        _event_lon: f64,
        _event_depth_km: f64,
        _sta_lat: f64,
        _sta_lon: f64,
    ) -> Option<TomographyPrediction> {
        None
    }

    fn reset(&self) {}
}
