//! The event data model: hypocenters, the working solution, phase
//! observations, readings and magnitude aggregates.

mod hypo;
mod magnitude;
mod observation;
mod solution;
mod station;

pub use hypo::{FixFlags, Hypo};
pub use magnitude::{MagnitudeType, NetworkMagnitude, ReadingMagnitude, StationMagnitude};
pub use observation::{Amp, Defining, Obs, Reading};
pub use solution::{DepthFixType, Sol};
pub use station::Station;
