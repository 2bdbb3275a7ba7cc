//! Phase-alternates lookup: expands a reported phase name into the
//! ordered candidate list tried during identification, and the per-phase
//! time window within which a candidate's prediction is accepted.

use crate::config::PhaseTaxonomy;

/// Candidate internal phase names to try for `reported`, in priority
/// order, per the configured [`PhaseTaxonomy::alternates`] table; falls
/// back to `[reported]` alone when the reported name has no configured
/// alternates (regional extensions the host hasn't listed still get a
/// literal try against the global table).
pub fn candidates_for(reported: &str, taxonomy: &PhaseTaxonomy) -> Vec<String> {
    taxonomy
        .alternates
        .get(reported)
        .cloned()
        .unwrap_or_else(|| vec![reported.to_string()])
}

/// Acceptance window (s) for a candidate phase's predicted time: tighter
/// for short-period regional phases, looser for teleseismic/core phases
/// whose travel-time tables carry more model uncertainty.
pub fn window_for(phase: &str) -> f64 {
    match phase {
        "Pg" | "Sg" | "Pb" | "Sb" | "Pn" | "Sn" | "Lg" => 5.0,
        "PKPdf" | "PKPbc" | "PKPab" | "PKP" | "PcP" | "ScS" => 15.0,
        "pP" | "sP" | "sS" | "pS" | "pwP" => 10.0,
        _ => 8.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_phase_falls_back_to_itself() {
        let taxonomy = PhaseTaxonomy::default();
        assert_eq!(candidates_for("Rg", &taxonomy), vec!["Rg".to_string()]);
    }

    #[test]
    fn p_expands_to_configured_alternates() {
        let taxonomy = PhaseTaxonomy::default();
        let candidates = candidates_for("P", &taxonomy);
        assert!(candidates.contains(&"Pn".to_string()));
        assert!(candidates.contains(&"Pg".to_string()));
    }
}
