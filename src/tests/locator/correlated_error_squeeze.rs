//! A cluster of close, same-phase stations (correlated errors enabled by
//! default) plus one bad outlier pick: the outlier should be demoted
//! during iteration and the run should still converge on a finite,
//! well-formed covariance.

use super::*;
use crate::diagnostics::Diagnostics;
use crate::locator::{locate, EventInput};
use crate::model::Hypo;

#[test]
fn clustered_stations_converge_and_demote_the_bad_outlier() {
    let tables = tables_with(&[("P", flat_table("P"))]);
    let cfg = default_cfg();
    assert!(cfg.correlated_errors.enabled);
    let mut diag = Diagnostics::default();

    let true_lat = 10.0;
    let true_lon = 20.0;
    let true_depth = 33.0;
    let true_origin = 1_000_000.0;

    // Three geographically close stations (tight cluster, correlated
    // errors in play) plus a well-separated fourth for azimuthal spread,
    // and a fifth pick with a badly wrong arrival time.
    let stations = [
        ("AAA", 0.1, 0.1, 40.0, 30.0, 0.0),
        ("AAB", 0.2, 0.0, 40.2, 32.0, 0.0),
        ("AAC", 0.0, 0.2, 39.8, 34.0, 0.0),
        ("DDD", -10.0, -40.0, 55.0, 280.0, 0.0),
        ("BAD", 0.15, 0.05, 41.0, 31.0, 500.0),
    ];

    let obs: Vec<_> = stations
        .iter()
        .map(|(sta, lat, lon, delta, esaz, time_offset)| {
            base_obs(sta, *lat, *lon, "P", *delta, *esaz, true_origin + *delta + *time_offset)
        })
        .collect();

    let reported = vec![Hypo::seed(true_origin, true_lat, true_lon, true_depth)];

    let event = EventInput {
        event_id: "correlated-cluster-with-outlier".into(),
        preferred_origin_id: None,
        reported,
        obs,
    };

    let solution = locate(event, &tables, &cfg, &mut diag).expect("should converge");

    assert!(!solution.obs.iter().find(|o| o.station == "BAD").unwrap().defining.any());
    assert!(solution.sol.sigma_lat.is_finite());
    assert!(solution.sol.sigma_lon.is_finite());
    assert!(solution.sol.sigma_depth.is_finite());
}
