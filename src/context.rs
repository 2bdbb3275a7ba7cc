//! Per-event mutable state: the NA PRNG, epicenter-walk tracking
//! for local-TT regeneration, and the regional-tomography reset hook.
//! Never a global or thread-local; always threaded explicitly through the
//! call stack.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::prediction::RegionalTomography;
use crate::tables::TtTableSet;

/// Exclusively owned by the per-event driver; released with the event.
pub struct Context<'a> {
    pub rng: SmallRng,
    /// local TT tables regenerated for the current epicenter, keyed by
    /// phase name; `None` until first computed or until invalidated by an
    /// epicenter walk beyond `EpiWalk`.
    local_tables: Option<TtTableSet>,
    local_tables_center: Option<(f64, f64)>,
    pub tomography: Option<&'a dyn RegionalTomography>,
}

impl<'a> Context<'a> {
    pub fn new(seed: u64, tomography: Option<&'a dyn RegionalTomography>) -> Self {
        if let Some(t) = tomography {
            t.reset();
        }
        Self {
            rng: SmallRng::seed_from_u64(seed),
            local_tables: None,
            local_tables_center: None,
            tomography,
        }
    }

    /// `true` if the epicenter has walked more than `epi_walk` degrees from
    /// the center the local tables were last built for (or no local tables
    /// exist yet).
    pub fn local_tables_stale(&self, lat: f64, lon: f64, epi_walk_deg: f64) -> bool {
        match self.local_tables_center {
            None => true,
            Some((clat, clon)) => {
                let (delta, _, _) = crate::geodesy::dist_azimuth(lat, lon, clat, clon);
                delta > epi_walk_deg
            }
        }
    }

    pub fn set_local_tables(&mut self, lat: f64, lon: f64, tables: TtTableSet) {
        self.local_tables_center = Some((lat, lon));
        self.local_tables = Some(tables);
    }

    pub fn local_tables(&self) -> Option<&TtTableSet> {
        self.local_tables.as_ref()
    }
}
