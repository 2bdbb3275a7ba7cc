//! Without enough depth-resolving evidence (depth phases, close stations,
//! S-P pairs, or core phases), the option loop must skip the free-depth
//! attempt entirely rather than let an under-constrained depth wander
//! into an airquake.

use super::*;
use crate::diagnostics::Diagnostics;
use crate::locator::{locate, EventInput};
use crate::model::{DepthFixType, Hypo};

#[test]
fn falls_back_to_default_depth_without_resolving_evidence() {
    let tables = tables_with(&[("Pn", flat_table("Pn"))]);
    let cfg = default_cfg();
    let mut diag = Diagnostics::default();

    // A single teleseismic P pick carries no depth-resolving power at all
    // (no depth phases, no close stations, no S-P pairs, no core phases).
    let obs = vec![base_obs("AAA", 0.0, 0.0, "Pn", 60.0, 90.0, 1_000_060.0)];
    let reported = vec![Hypo::seed(1_000_000.0, 10.0, 20.0, 10.0)];

    let event = EventInput {
        event_id: "under-constrained-depth".into(),
        preferred_origin_id: None,
        reported,
        obs,
    };

    let solution = locate(event, &tables, &cfg, &mut diag).expect("default-depth option should converge");

    assert!(!matches!(solution.sol.depth_fix, DepthFixType::Free));
    assert!(!diag.option_attempts.iter().any(|a| a.option == "Free"));
    assert!(diag
        .option_attempts
        .iter()
        .any(|a| a.option == "DefaultDepth" && a.outcome == "converged"));
}
