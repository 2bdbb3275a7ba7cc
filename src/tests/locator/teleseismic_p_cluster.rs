//! A ring of teleseismic P arrivals around a known epicenter should
//! converge with a small azimuthal gap and a tight epicentral error.

use super::*;
use crate::diagnostics::Diagnostics;
use crate::locator::{locate, EventInput};
use crate::model::Hypo;

#[test]
fn converges_with_small_gap_for_a_well_distributed_ring() {
    let tables = tables_with(&[("P", flat_table("P")), ("Pn", flat_table("Pn"))]);
    let cfg = default_cfg();
    let mut diag = Diagnostics::default();

    let true_lat = 10.0;
    let true_lon = 20.0;
    let true_depth = 33.0;
    let true_origin = 1_000_000.0;

    let stations = [
        ("AAA", 0.0, 0.0, "P", 40.0, 35.0),
        ("BBB", -40.0, 40.0, "P", 50.0, 120.0),
        ("CCC", 40.0, 40.0, "P", 45.0, 200.0),
        ("DDD", -10.0, -40.0, "P", 55.0, 280.0),
    ];

    let obs = stations
        .iter()
        .map(|(sta, lat, lon, phase, delta, esaz)| {
            base_obs(sta, *lat, *lon, phase, *delta, *esaz, true_origin + *delta)
        })
        .collect::<Vec<_>>();

    let reported = vec![Hypo::seed(true_origin, true_lat, true_lon, true_depth)];

    let event = EventInput {
        event_id: "teleseismic-ring".into(),
        preferred_origin_id: None,
        reported,
        obs,
    };

    let solution = locate(event, &tables, &cfg, &mut diag).expect("should converge");
    assert!(solution.sol.ndef >= 4);
    assert!(solution.quality.gap < 180.0);
}
