//! Fake depth phases: at convergence, observations whose reported
//! label looks like a depth phase (`pP`, `sP`, `pwP`, ...) but that
//! `identify` could not associate are temporarily relabelled to the
//! reserved `pFAKE`/`sFAKE` tags so a predicted time and residual can be
//! computed and displayed to the downstream report, then stripped back
//! to their original (`unknown`-preserving) label. The observation count
//! never changes; only the label is mutated and restored.

use crate::model::Obs;
use crate::tables::Tables;

pub const FAKE_P: &str = "pFAKE";
pub const FAKE_S: &str = "sFAKE";

/// A phase label looks like an up-going depth phase if it starts with a
/// lowercase 'p' or 's' followed by an uppercase leg letter (`pP`, `sP`,
/// `sS`, `pS`, `pwP`, ...).
fn looks_like_depth_phase(label: &str) -> bool {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some('p'), Some(c)) | (Some('s'), Some(c)) => c.is_ascii_uppercase(),
        _ => false,
    }
}

/// Relabels every observation whose identification failed (`phase ==
/// reported_phase` after a failed `identify` pass) but whose
/// `reported_phase` looks like a depth phase, so it will be picked up by
/// `residuals` and given a predicted time for display purposes. Returns
/// `(index, original_phase)` pairs to restore with
/// [`strip_fake_depth_phases`].
pub fn materialize_fake_depth_phases(obs: &mut [Obs], tables: &Tables) -> Vec<(usize, String)> {
    let mut restored = Vec::new();
    for (i, o) in obs.iter_mut().enumerate() {
        if o.phase != o.reported_phase {
            continue; // already identified to something real
        }
        if !looks_like_depth_phase(&o.reported_phase) {
            continue;
        }
        let fake = if o.reported_phase.starts_with('p') { FAKE_P } else { FAKE_S };
        // only materialise if the global table set actually carries the
        // reserved composite table, otherwise there is nothing to predict.
        if tables.travel_time.contains(fake) {
            restored.push((i, o.phase.clone()));
            o.phase = fake.to_string();
        }
    }
    restored
}

/// Restores the original phase label on every observation materialised by
/// [`materialize_fake_depth_phases`], in any order.
pub fn strip_fake_depth_phases(obs: &mut [Obs], materialized: &[(usize, String)]) {
    for (i, original) in materialized {
        if let Some(o) = obs.get_mut(*i) {
            o.phase = original.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_depth_phase_shapes() {
        assert!(looks_like_depth_phase("pP"));
        assert!(looks_like_depth_phase("sP"));
        assert!(looks_like_depth_phase("pwP"));
        assert!(!looks_like_depth_phase("P"));
        assert!(!looks_like_depth_phase("Pg"));
    }
}
