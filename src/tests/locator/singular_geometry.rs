//! Too few defining phases for the number of free unknowns must fail
//! fast with `InsufficientPhases` rather than attempt an inversion.

use super::*;
use crate::diagnostics::Diagnostics;
use crate::error::Error;
use crate::locator::{locate, EventInput};
use crate::model::Hypo;

#[test]
fn two_stations_cannot_resolve_a_four_parameter_hypocenter() {
    let tables = tables_with(&[("P", flat_table("P"))]);
    let cfg = default_cfg();
    let mut diag = Diagnostics::default();

    let obs = vec![
        base_obs("AAA", 0.0, 0.0, "P", 40.0, 35.0, 1_000_040.0),
        base_obs("BBB", 1.0, 1.0, "P", 41.0, 40.0, 1_000_041.0),
    ];
    let reported = vec![Hypo::seed(1_000_000.0, 10.0, 20.0, 33.0)];

    let event = EventInput {
        event_id: "too-few-phases".into(),
        preferred_origin_id: None,
        reported,
        obs,
    };

    let result = locate(event, &tables, &cfg, &mut diag);
    assert!(matches!(result, Err(Error::InsufficientPhases { .. })));
}
