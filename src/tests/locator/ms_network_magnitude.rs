//! Three LR (surface-wave) amplitude readings at well-placed stations
//! should aggregate into a network MS magnitude.

use super::*;
use crate::diagnostics::Diagnostics;
use crate::locator::{locate, EventInput};
use crate::model::{Defining, Hypo, MagnitudeType};

#[test]
fn three_surface_wave_stations_produce_a_network_ms() {
    let tables = tables_with(&[("P", flat_table("P"))]);
    let cfg = default_cfg();
    let mut diag = Diagnostics::default();

    let true_lat = 10.0;
    let true_lon = 20.0;
    let true_depth = 10.0;
    let true_origin = 1_000_000.0;

    let rings = [
        ("AAA", 0.0, 0.0, "P", 40.0, 35.0),
        ("BBB", -40.0, 40.0, "P", 50.0, 120.0),
        ("CCC", 40.0, 40.0, "P", 45.0, 200.0),
        ("DDD", -10.0, -40.0, "P", 55.0, 280.0),
    ];

    let mut obs: Vec<_> = rings
        .iter()
        .map(|(sta, lat, lon, phase, delta, esaz)| {
            base_obs(sta, *lat, *lon, phase, *delta, *esaz, true_origin + *delta)
        })
        .collect();

    for (i, sta) in ["AAA", "BBB", "CCC"].iter().enumerate() {
        let (_, lat, lon, _, delta, esaz) = rings[i];
        let mut surface_wave = base_obs(sta, lat, lon, "LR", delta, esaz, 0.0);
        surface_wave.time = None;
        surface_wave.defining = Defining::default();
        let at = 500.0 + i as f64 * 50.0;
        surface_wave.amplitudes.push(amp_component(at, 20.0, 'N', MagnitudeType::Ms));
        surface_wave.amplitudes.push(amp_component(at, 20.0, 'E', MagnitudeType::Ms));
        obs.push(surface_wave);
    }

    let reported = vec![Hypo::seed(true_origin, true_lat, true_lon, true_depth)];

    let event = EventInput {
        event_id: "surface-wave-network".into(),
        preferred_origin_id: None,
        reported,
        obs,
    };

    let solution = locate(event, &tables, &cfg, &mut diag).expect("should converge");

    let ms = solution
        .network_magnitudes
        .iter()
        .find(|m| m.mag_type == MagnitudeType::Ms)
        .expect("MS network magnitude should be computed");
    assert!(ms.num_stations >= 3);
    assert!(ms.value.is_finite());
}
