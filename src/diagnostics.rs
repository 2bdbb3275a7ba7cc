//! Per-event diagnostics sink: the inversion kernel and the locator
//! driver append to this instead of logging at `info!` level, so a host
//! program can inspect or render the full iteration history without
//! scraping log output. Never read by the core itself.

/// One inversion-kernel iteration's full state, in (time, lat, lon, depth)
/// order wherever a per-parameter quantity is recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationLog {
    pub iteration: usize,
    pub ndef: usize,
    pub num_unknowns: usize,
    pub rank: usize,
    pub condition_number: f64,
    pub damping: f64,
    pub step_norm: f64,
    /// Paige-Saunders convergence statistic for this step.
    pub convergence_stat: f64,
    pub origin_time: f64,
    pub lat: f64,
    pub lon: f64,
    pub depth: f64,
    pub weighted_rms: f64,
}

/// Outcome of one option-loop attempt: which depth-constraint
/// option was tried and what happened.
#[derive(Debug, Clone)]
pub struct OptionAttempt {
    pub option: String,
    pub outcome: String,
}

/// Accumulates the full per-event history behind [`crate::locate`]. A
/// fresh instance is created by the caller and threaded through by
/// mutable reference; the core never reads it back.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub iterations: Vec<IterationLog>,
    pub option_attempts: Vec<OptionAttempt>,
    /// `(observation index, phase name)` pairs demoted at any point during
    /// the location, across every option attempt.
    pub demoted_phases: Vec<(usize, String)>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn record_option(&mut self, option: impl Into<String>, outcome: impl Into<String>) {
        self.option_attempts.push(OptionAttempt { option: option.into(), outcome: outcome.into() });
    }
}
