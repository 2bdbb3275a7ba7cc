//! Immutable locator configuration: every tunable named in the
//! external-interfaces section, grouped into nested structs by concern the
//! way the reference crate groups its solver knobs, each default backed by
//! its own `default_xxx()` free function.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_min_iterations() -> usize {
    4
}
fn default_max_iterations() -> usize {
    20
}
fn default_min_ndef_phases() -> usize {
    4
}
fn default_default_depth() -> f64 {
    0.0
}
fn default_moho_km() -> f64 {
    35.0
}
fn default_conrad_km() -> f64 {
    20.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IterationConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_min_iterations"))]
    pub min_iterations: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_min_ndef_phases"))]
    pub min_ndef_phases: usize,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            min_iterations: default_min_iterations(),
            max_iterations: default_max_iterations(),
            min_ndef_phases: default_min_ndef_phases(),
        }
    }
}

fn default_max_hypocenter_depth() -> f64 {
    700.0
}
fn default_max_shallow_depth_error() -> f64 {
    30.0
}
fn default_max_deep_depth_error() -> f64 {
    50.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_default_depth"))]
    pub default_depth: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_moho_km"))]
    pub moho_km: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_conrad_km"))]
    pub conrad_km: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_hypocenter_depth"))]
    pub max_hypocenter_depth: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_shallow_depth_error"))]
    pub max_shallow_depth_error: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_deep_depth_error"))]
    pub max_deep_depth_error: f64,
    /// minimum depth-phase/local-station/S-P/core-phase counts for the
    /// depth-resolution predicate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub resolution: DepthResolutionConfig,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            default_depth: default_default_depth(),
            moho_km: default_moho_km(),
            conrad_km: default_conrad_km(),
            max_hypocenter_depth: default_max_hypocenter_depth(),
            max_shallow_depth_error: default_max_shallow_depth_error(),
            max_deep_depth_error: default_max_deep_depth_error(),
            resolution: DepthResolutionConfig::default(),
        }
    }
}

fn default_min_depth_phases() -> usize {
    3
}
fn default_min_depth_phase_agencies() -> usize {
    2
}
fn default_min_local_stations() -> usize {
    3
}
fn default_min_sp_pairs() -> usize {
    3
}
fn default_min_core_phases() -> usize {
    2
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthResolutionConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_min_depth_phases"))]
    pub min_depth_phases: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_min_depth_phase_agencies"))]
    pub min_depth_phase_agencies: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_min_local_stations"))]
    pub min_local_stations: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_min_sp_pairs"))]
    pub min_sp_pairs: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_min_core_phases"))]
    pub min_core_phases: usize,
}

impl Default for DepthResolutionConfig {
    fn default() -> Self {
        Self {
            min_depth_phases: default_min_depth_phases(),
            min_depth_phase_agencies: default_min_depth_phase_agencies(),
            min_local_stations: default_min_local_stations(),
            min_sp_pairs: default_min_sp_pairs(),
            min_core_phases: default_min_core_phases(),
        }
    }
}

fn default_do_correlated_errors() -> bool {
    true
}
fn default_allow_damping() -> bool {
    true
}
fn default_confidence_level() -> f64 {
    90.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrelatedErrorConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_do_correlated_errors"))]
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_allow_damping"))]
    pub allow_damping: bool,
    /// confidence level (%) used both for the projection-matrix retained
    /// eigenspace and the model-covariance chi-square scale.
    #[cfg_attr(feature = "serde", serde(default = "default_confidence_level"))]
    pub confidence_level: f64,
    /// cumulative eigenvalue contribution at which projection retains
    /// components; distinct from `confidence_level`, which scales
    /// the covariance ellipse.
    #[cfg_attr(feature = "serde", serde(default = "default_projection_confidence"))]
    pub projection_confidence: f64,
}

fn default_projection_confidence() -> f64 {
    0.95
}

impl Default for CorrelatedErrorConfig {
    fn default() -> Self {
        Self {
            enabled: default_do_correlated_errors(),
            allow_damping: default_allow_damping(),
            confidence_level: default_confidence_level(),
            projection_confidence: default_projection_confidence(),
        }
    }
}

fn default_do_grid_search() -> bool {
    true
}
fn default_na_search_radius_deg() -> f64 {
    5.0
}
fn default_na_search_depth_km() -> f64 {
    300.0
}
fn default_na_search_ot_s() -> f64 {
    30.0
}
fn default_na_lp_norm() -> f64 {
    1.2
}
fn default_na_iter_max() -> usize {
    5
}
fn default_na_initial_sample() -> usize {
    700
}
fn default_na_next_sample() -> usize {
    100
}
fn default_na_cells() -> usize {
    25
}
fn default_iseed() -> u64 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NaConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_do_grid_search"))]
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_na_search_radius_deg"))]
    pub search_radius_deg: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_na_search_depth_km"))]
    pub search_depth_km: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_na_search_ot_s"))]
    pub search_ot_s: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_na_lp_norm"))]
    pub lp_norm: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_na_iter_max"))]
    pub iter_max: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_na_initial_sample"))]
    pub initial_sample: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_na_next_sample"))]
    pub next_sample: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_na_cells"))]
    pub cells: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_iseed"))]
    pub iseed: u64,
}

impl Default for NaConfig {
    fn default() -> Self {
        Self {
            enabled: default_do_grid_search(),
            search_radius_deg: default_na_search_radius_deg(),
            search_depth_km: default_na_search_depth_km(),
            search_ot_s: default_na_search_ot_s(),
            lp_norm: default_na_lp_norm(),
            iter_max: default_na_iter_max(),
            initial_sample: default_na_initial_sample(),
            next_sample: default_na_next_sample(),
            cells: default_na_cells(),
            iseed: default_iseed(),
        }
    }
}

fn default_sigma_threshold() -> f64 {
    6.0
}
fn default_p_surf_vel() -> f64 {
    5.8
}
fn default_s_surf_vel() -> f64 {
    3.46
}
fn default_max_local_tt_delta() -> f64 {
    3.0
}
fn default_use_local_tt() -> bool {
    false
}
fn default_use_rstt() -> bool {
    false
}
fn default_epi_walk() -> f64 {
    0.5
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TravelTimeConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_sigma_threshold"))]
    pub sigma_threshold: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_p_surf_vel"))]
    pub p_surface_velocity: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_s_surf_vel"))]
    pub s_surface_velocity: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_max_local_tt_delta"))]
    pub max_local_tt_delta_deg: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_use_local_tt"))]
    pub use_local_tt: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_use_rstt"))]
    pub use_rstt: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_epi_walk"))]
    pub epi_walk_deg: f64,
}

impl Default for TravelTimeConfig {
    fn default() -> Self {
        Self {
            sigma_threshold: default_sigma_threshold(),
            p_surface_velocity: default_p_surf_vel(),
            s_surface_velocity: default_s_surf_vel(),
            max_local_tt_delta_deg: default_max_local_tt_delta(),
            use_local_tt: default_use_local_tt(),
            use_rstt: default_use_rstt(),
            epi_walk_deg: default_epi_walk(),
        }
    }
}

fn default_min_netmag_sta() -> usize {
    3
}
fn default_mag_max_time_residual() -> f64 {
    10.0
}
fn default_magnitude_range_limit() -> f64 {
    2.2
}
fn default_ms_max_depth() -> f64 {
    60.0
}
fn default_mb_min_dist_deg() -> f64 {
    20.0
}
fn default_mb_max_dist_deg() -> f64 {
    105.0
}
fn default_mb_min_period() -> f64 {
    0.3
}
fn default_mb_max_period() -> f64 {
    3.0
}
fn default_ms_min_dist_deg() -> f64 {
    20.0
}
fn default_ms_max_dist_deg() -> f64 {
    160.0
}
fn default_ms_min_period() -> f64 {
    10.0
}
fn default_ms_max_period() -> f64 {
    60.0
}
fn default_ms_period_range() -> f64 {
    5.0
}
fn default_ml_max_dist_km() -> f64 {
    1000.0
}
fn default_bb_mb_min_dist_deg() -> f64 {
    5.0
}
fn default_bb_mb_max_dist_deg() -> f64 {
    105.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MagnitudeConfig {
    #[cfg_attr(feature = "serde", serde(default = "default_min_netmag_sta"))]
    pub min_netmag_sta: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_mag_max_time_residual"))]
    pub max_time_residual: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_magnitude_range_limit"))]
    pub magnitude_range_limit: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_ms_max_depth"))]
    pub ms_max_depth: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_mb_min_dist_deg"))]
    pub mb_min_dist_deg: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_mb_max_dist_deg"))]
    pub mb_max_dist_deg: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_mb_min_period"))]
    pub mb_min_period: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_mb_max_period"))]
    pub mb_max_period: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_ms_min_dist_deg"))]
    pub ms_min_dist_deg: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_ms_max_dist_deg"))]
    pub ms_max_dist_deg: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_ms_min_period"))]
    pub ms_min_period: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_ms_max_period"))]
    pub ms_max_period: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_ms_period_range"))]
    pub ms_period_range: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_ml_max_dist_km"))]
    pub ml_max_dist_km: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_bb_mb_min_dist_deg"))]
    pub bb_mb_min_dist_deg: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_bb_mb_max_dist_deg"))]
    pub bb_mb_max_dist_deg: f64,
}

impl Default for MagnitudeConfig {
    fn default() -> Self {
        Self {
            min_netmag_sta: default_min_netmag_sta(),
            max_time_residual: default_mag_max_time_residual(),
            magnitude_range_limit: default_magnitude_range_limit(),
            ms_max_depth: default_ms_max_depth(),
            mb_min_dist_deg: default_mb_min_dist_deg(),
            mb_max_dist_deg: default_mb_max_dist_deg(),
            mb_min_period: default_mb_min_period(),
            mb_max_period: default_mb_max_period(),
            ms_min_dist_deg: default_ms_min_dist_deg(),
            ms_max_dist_deg: default_ms_max_dist_deg(),
            ms_min_period: default_ms_min_period(),
            ms_max_period: default_ms_max_period(),
            ms_period_range: default_ms_period_range(),
            ml_max_dist_km: default_ml_max_dist_km(),
            bb_mb_min_dist_deg: default_bb_mb_min_dist_deg(),
            bb_mb_max_dist_deg: default_bb_mb_max_dist_deg(),
        }
    }
}

fn default_conv_tol() -> f64 {
    0.01
}

/// Convergence/divergence tolerances consumed by the inversion kernel
///. Kept separate from [`IterationConfig`] because these
/// are dimensionless thresholds on the Paige-Saunders `cvg` statistic and
/// model norm, not iteration counts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConvergenceConfig {
    /// `CONV_TOL`: cvg threshold below which the kernel may declare
    /// convergence (subject to the other conditions of step 9).
    #[cfg_attr(feature = "serde", serde(default = "default_conv_tol"))]
    pub cvg_tol: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            cvg_tol: default_conv_tol(),
        }
    }
}

/// Phase lists a host program supplies rather than the core inventing
///: alternates tested per reported phase during identification,
/// phases admissible for each magnitude type, and phases for which no
/// time residual is expected (amplitude-only arrivals).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseTaxonomy {
    /// reported phase name -> ordered candidate internal names tried
    /// during identification, closest-in-time wins.
    pub alternates: std::collections::HashMap<String, Vec<String>>,
    pub mb_phases: Vec<String>,
    pub ms_phases: Vec<String>,
    pub ml_phases: Vec<String>,
    pub mb_broadband_phases: Vec<String>,
    /// phases retained for amplitude/magnitude purposes but that never
    /// enter the defining set for inversion even when a time is reported.
    pub amplitude_only: Vec<String>,
}

impl Default for PhaseTaxonomy {
    fn default() -> Self {
        let mut alternates = std::collections::HashMap::new();
        alternates.insert("P".to_string(), vec!["P".into(), "Pn".into(), "Pg".into(), "Pb".into()]);
        alternates.insert("S".to_string(), vec!["S".into(), "Sn".into(), "Sg".into(), "Sb".into(), "Lg".into()]);
        alternates.insert(
            "PKP".to_string(),
            vec!["PKPdf".into(), "PKPbc".into(), "PKPab".into(), "PKP".into()],
        );
        alternates.insert("PcP".to_string(), vec!["PcP".into()]);
        alternates.insert("ScS".to_string(), vec!["ScS".into()]);
        alternates.insert("pP".to_string(), vec!["pP".into()]);
        alternates.insert("sP".to_string(), vec!["sP".into()]);
        alternates.insert("sS".to_string(), vec!["sS".into()]);
        alternates.insert("pS".to_string(), vec!["pS".into()]);
        alternates.insert("pwP".to_string(), vec!["pwP".into()]);

        Self {
            alternates,
            mb_phases: vec!["P".into(), "Pn".into(), "Pg".into()],
            ms_phases: vec!["LR".into(), "LQ".into()],
            ml_phases: vec!["Sg".into(), "Lg".into(), "S".into()],
            mb_broadband_phases: vec!["P".into(), "Pn".into()],
            amplitude_only: vec!["LR".into(), "LQ".into(), "IAML".into()],
        }
    }
}

/// Aggregates every tunable into nested, concern-grouped structs.
/// Use a named preset (`Config::teleseismic()`, `Config::regional()`) and
/// override fields with struct-update syntax, the same idiom the
/// reference crate uses for its own solver configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    #[cfg_attr(feature = "serde", serde(default))]
    pub iteration: IterationConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub depth: DepthConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub correlated_errors: CorrelatedErrorConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub na: NaConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub travel_time: TravelTimeConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub magnitude: MagnitudeConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub convergence: ConvergenceConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub taxonomy: PhaseTaxonomy,
}

impl Default for Config {
    fn default() -> Self {
        Self::teleseismic()
    }
}

impl Config {
    /// Default preset tuned for teleseismic (Δ > 20 deg) networks: local
    /// tables and RSTT off, correlated errors and NA on.
    pub fn teleseismic() -> Self {
        Self {
            iteration: IterationConfig::default(),
            depth: DepthConfig::default(),
            correlated_errors: CorrelatedErrorConfig::default(),
            na: NaConfig::default(),
            travel_time: TravelTimeConfig::default(),
            magnitude: MagnitudeConfig::default(),
            convergence: ConvergenceConfig::default(),
            taxonomy: PhaseTaxonomy::default(),
        }
    }

    /// Preset tuned for regional/local networks: enables local TT tables
    /// and widens the NA search depth/radius for shallower, closer events.
    pub fn regional() -> Self {
        Self {
            travel_time: TravelTimeConfig {
                use_local_tt: true,
                ..TravelTimeConfig::default()
            },
            na: NaConfig {
                search_radius_deg: 2.0,
                search_depth_km: 100.0,
                ..NaConfig::default()
            },
            ..Self::teleseismic()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_override_expected_fields() {
        let regional = Config::regional();
        assert!(regional.travel_time.use_local_tt);
        assert_eq!(regional.na.search_radius_deg, 2.0);
    }
}
