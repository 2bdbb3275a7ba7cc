//! Enough depth-phase evidence (distinct reporting agencies included)
//! should unlock the free-depth option rather than force a fallback to
//! a fixed-depth strategy.

use super::*;
use crate::diagnostics::Diagnostics;
use crate::locator::{locate, EventInput};
use crate::model::{Defining, Hypo};

#[test]
fn sufficient_depth_phase_evidence_unlocks_free_depth() {
    let tables = tables_with(&[("P", flat_table("P"))]);
    let cfg = default_cfg();
    let mut diag = Diagnostics::default();

    let true_lat = 10.0;
    let true_lon = 20.0;
    let true_depth = 33.0;
    let true_origin = 1_000_000.0;

    let rings = [
        ("AAA", 0.0, 0.0, 40.0, 35.0),
        ("BBB", -40.0, 40.0, 50.0, 120.0),
        ("CCC", 40.0, 40.0, 45.0, 200.0),
        ("DDD", -10.0, -40.0, 55.0, 280.0),
    ];

    let mut obs: Vec<_> = rings
        .iter()
        .map(|(sta, lat, lon, delta, esaz)| base_obs(sta, *lat, *lon, "P", *delta, *esaz, true_origin + *delta))
        .collect();

    // Three depth-phase picks (pP) from two distinct agencies, satisfying
    // the default minimums (3 depth phases across >= 2 agencies).
    let agencies = ["ISC", "ISC", "NEIC"];
    for (i, agency) in agencies.iter().enumerate() {
        let (sta, lat, lon, delta, esaz) = rings[i];
        let mut dp = base_obs(sta, lat, lon, "pP", delta, esaz, true_origin + delta + 200.0);
        dp.agency = agency.to_string();
        dp.defining = Defining { time: true, azimuth: false, slowness: false };
        obs.push(dp);
    }

    let reported = vec![Hypo::seed(true_origin, true_lat, true_lon, true_depth)];

    let event = EventInput {
        event_id: "depth-phase-resolved".into(),
        preferred_origin_id: None,
        reported,
        obs,
    };

    let solution = locate(event, &tables, &cfg, &mut diag).expect("should converge");
    let _ = solution;

    assert!(diag.option_attempts.iter().any(|a| a.option == "Free"));
}
