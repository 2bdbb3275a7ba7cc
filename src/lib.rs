#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod config;
mod constants;
mod context;
mod covariance;
mod diagnostics;
mod error;
mod geodesy;
mod identification;
mod inversion;
mod locator;
mod magnitude;
mod model;
mod na;
mod numerics;
mod prediction;
mod quality;
mod rows;
mod tables;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::config::{
        Config, ConvergenceConfig, CorrelatedErrorConfig, DepthConfig, DepthResolutionConfig,
        IterationConfig, MagnitudeConfig, NaConfig, PhaseTaxonomy, TravelTimeConfig,
    };
    pub use crate::context::Context;
    pub use crate::diagnostics::{Diagnostics, IterationLog, OptionAttempt};
    pub use crate::error::{Error, TableError};
    pub use crate::locator::{locate, EventInput, Solution};
    pub use crate::model::{
        Amp, Defining, DepthFixType, FixFlags, Hypo, MagnitudeType, NetworkMagnitude, Obs,
        Reading, ReadingMagnitude, Sol, Station, StationMagnitude,
    };
    pub use crate::prediction::{NoRegionalTomography, RegionalTomography, TomographyPrediction};
    pub use crate::quality::Quality;
    pub use crate::tables::{
        EllipticityCoefficients, EllipticityTableSet, MagnitudeQTable, RegionDepthGrid,
        TopographyGrid, Tables, TtTable, TtTableSet, Variogram,
    };
    pub use nalgebra::{DMatrix, DVector};
}
