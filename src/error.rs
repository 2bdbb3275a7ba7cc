use thiserror::Error;

/// Errors returned while loading the long-lived auxiliary table set
/// (travel-time tables, ellipticity coefficients, topography grid, ...).
/// These are startup-time failures: by the time an event reaches [`crate::locator::locate`]
/// the tables are known-good and immutably borrowed.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to open table file {path}: {source}")]
    CannotOpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to allocate table storage: {0}")]
    CannotAllocate(String),
    #[error("malformed table {table}: {reason}")]
    Parse { table: String, reason: String },
}

/// Per-event error taxonomy. Mutually exclusive per outcome: exactly one
/// tag (or none, on convergence) is emitted per call to
/// [`crate::locator::locate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Number of defining observations did not exceed the number of free
    /// unknowns; the event is failed and the previous origin is kept.
    #[error("insufficient defining phases: ndef={ndef} unknowns={unknowns}")]
    InsufficientPhases { ndef: usize, unknowns: usize },
    /// Free depth was attempted without satisfying the depth-resolution
    /// predicate of the option loop.
    #[error("no depth resolution criteria satisfied for free-depth option")]
    NoDepthResolution,
    /// Converged, but the depth uncertainty exceeds the configured band.
    #[error("converged depth error {sigma_z} exceeds allowed band")]
    DepthErrorTooLarge { sigma_z: f64 },
    /// The iteration history indicates monotone divergence.
    #[error("inversion diverged after {iterations} iterations")]
    Divergent { iterations: usize },
    /// SVD rank deficit: fewer independent directions than unknowns.
    #[error("singular normal equations: rank={rank} unknowns={unknowns}")]
    SingularNormalEquations { rank: usize, unknowns: usize },
    /// Condition number exceeded the configured ill-conditioning threshold.
    #[error("ill-conditioned system: cond={cond}")]
    IllConditioned { cond: f64 },
    /// Iteration budget exhausted without satisfying the convergence test.
    #[error("maximum iterations ({max_iterations}) reached without convergence")]
    MaxIterationsReached { max_iterations: usize },
    /// An observation referenced a station key absent from the station table.
    #[error("observation references unknown station {0}")]
    InvalidStation(String),
}

impl Error {
    /// `true` if the driver should retry with a different option rather
    /// than giving up on the event entirely.
    pub fn is_recoverable_by_option_loop(&self) -> bool {
        matches!(
            self,
            Error::NoDepthResolution | Error::DepthErrorTooLarge { .. } | Error::Divergent { .. }
        )
    }
}
