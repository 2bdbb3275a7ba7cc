//! Magnitude computation: per-reading magnitudes (the amplitude/period
//! pair maximising A/T within each type's window), then station
//! aggregation and a 20%-trimmed median/MAD network magnitude, for each
//! of mb, MS, ML and mB independently.

use std::collections::HashMap;

use crate::config::Config;
use crate::constants::{DEG2KM, MAD_TO_SIGMA};
use crate::model::{Amp, MagnitudeType, NetworkMagnitude, Obs, Reading, ReadingMagnitude, Sol, StationMagnitude};
use crate::numerics::median;
use crate::tables::Tables;

/// Richter-style local-magnitude attenuation (`-log10(A0)`), Hutton-Boore
/// form: `1.110*log10(delta_km/100) + 0.00189*(delta_km-100) + 3.0`. ML is
/// intentionally not Q-table driven: it has no distance/depth grid, only
/// this closed-form attenuation over epicentral distance in km.
fn ml_attenuation(delta_km: f64) -> f64 {
    1.110 * (delta_km / 100.0).log10() + 0.00189 * (delta_km - 100.0) + 3.0
}

fn mb_value(amplitude_nm: f64, period_s: f64, delta_deg: f64, depth_km: f64, q: &crate::tables::MagnitudeQTable) -> Option<f64> {
    let qv = q.lookup(delta_deg, depth_km).ok()?;
    Some((amplitude_nm / period_s).log10() + qv)
}

/// Prague (IASPEI) MS formula, horizontal form: `log10(sqrt((A_N/T_N)^2 +
/// (A_E/T_E)^2)) + 1.66*log10(delta_deg) + 0.3`. The `0.3` (rather than
/// the textbook `3.3`) is the textbook constant minus `log10(1000)`: this
/// crate's `Amp::amplitude` is in nanometres (see `Amp` doc comment) while
/// the Prague formula is defined for amplitudes in micrometres.
fn ms_value(horizontal_at: f64, delta_deg: f64) -> Option<f64> {
    if delta_deg <= 0.0 || horizontal_at <= 0.0 {
        return None;
    }
    Some(horizontal_at.log10() + 1.66 * delta_deg.log10() + 0.3)
}

fn ml_value(amplitude_nm: f64, delta_km: f64) -> f64 {
    amplitude_nm.log10() + ml_attenuation(delta_km)
}

/// Picks the amplitude maximising A/T among `slice`'s amplitudes that
/// match `phase`, `component` (when given) and `mag_type`, and whose
/// (distance, period) fall within the caller's windows. Returns the
/// owning `Obs` (for its distance) and the chosen `Amp`.
fn best_amplitude_over_period<'o>(
    slice: &'o [Obs],
    phases: &[String],
    mag_type: MagnitudeType,
    component: Option<char>,
    in_window: impl Fn(&Obs, &Amp) -> bool,
) -> Option<(&'o Obs, &'o Amp)> {
    slice
        .iter()
        .filter(|o| phases.iter().any(|p| p == &o.phase))
        .flat_map(|o| o.amplitudes.iter().map(move |a| (o, a)))
        .filter(|(_, a)| a.mag_type == mag_type)
        .filter(|(_, a)| component.map_or(true, |c| a.component == c))
        .filter(|(o, a)| in_window(o, a))
        .max_by(|(_, a), (_, b)| {
            (a.amplitude / a.period).partial_cmp(&(b.amplitude / b.period)).unwrap()
        })
}

/// Per-reading magnitudes: for each reading (consecutive run of `Obs`
/// sharing station/agency) and each magnitude type, selects the
/// amplitude/period pair maximising A/T within that type's admissible
/// distance/period window and phase whitelist (vertical component for
/// mb/mB/ML; MS combines the best north and east horizontal amplitudes
/// per §4.J), then emits one [`ReadingMagnitude`].
pub fn reading_magnitudes(obs: &[Obs], sol: &Sol, tables: &Tables, cfg: &Config) -> Vec<ReadingMagnitude> {
    let mut out = Vec::new();
    let depth = sol.hypo.depth;

    for reading in Reading::group(obs) {
        let slice = &obs[reading.start..reading.start + reading.count];
        let station = slice[0].station.clone();
        let agency = slice[0].agency.clone();
        let defining_enough = slice
            .iter()
            .all(|o| o.time_residual.map(|r| r.abs() <= cfg.magnitude.max_time_residual).unwrap_or(true));
        if !defining_enough {
            continue;
        }

        if let Some((o, amp)) = best_amplitude_over_period(slice, &cfg.taxonomy.mb_phases, MagnitudeType::Mb, Some('Z'), |o, a| {
            o.delta >= cfg.magnitude.mb_min_dist_deg
                && o.delta <= cfg.magnitude.mb_max_dist_deg
                && a.period >= cfg.magnitude.mb_min_period
                && a.period <= cfg.magnitude.mb_max_period
        }) {
            if let Some(q) = tables.magnitude_q.get(&MagnitudeType::Mb) {
                if let Some(value) = mb_value(amp.amplitude, amp.period, o.delta, depth, q) {
                    out.push(ReadingMagnitude { mag_type: MagnitudeType::Mb, station: station.clone(), agency: agency.clone(), value });
                }
            }
        }

        if let Some((o, amp)) = best_amplitude_over_period(
            slice,
            &cfg.taxonomy.mb_broadband_phases,
            MagnitudeType::MB,
            Some('Z'),
            |o, _a| o.delta >= cfg.magnitude.bb_mb_min_dist_deg && o.delta <= cfg.magnitude.bb_mb_max_dist_deg,
        ) {
            if let Some(q) = tables.magnitude_q.get(&MagnitudeType::MB) {
                if let Some(value) = mb_value(amp.amplitude, amp.period, o.delta, depth, q) {
                    out.push(ReadingMagnitude { mag_type: MagnitudeType::MB, station: station.clone(), agency: agency.clone(), value });
                }
            }
        }

        if let Some((o, amp)) = best_amplitude_over_period(slice, &cfg.taxonomy.ml_phases, MagnitudeType::Ml, Some('Z'), |o, _a| {
            o.delta * DEG2KM <= cfg.magnitude.ml_max_dist_km
        }) {
            out.push(ReadingMagnitude {
                mag_type: MagnitudeType::Ml,
                station: station.clone(),
                agency: agency.clone(),
                value: ml_value(amp.amplitude, o.delta * DEG2KM),
            });
        }

        if depth <= cfg.magnitude.ms_max_depth {
            let ms_window = |o: &Obs, a: &Amp| {
                o.delta >= cfg.magnitude.ms_min_dist_deg
                    && o.delta <= cfg.magnitude.ms_max_dist_deg
                    && a.period >= cfg.magnitude.ms_min_period
                    && a.period <= cfg.magnitude.ms_max_period
            };
            let north = best_amplitude_over_period(slice, &cfg.taxonomy.ms_phases, MagnitudeType::Ms, Some('N'), ms_window);
            let east = best_amplitude_over_period(slice, &cfg.taxonomy.ms_phases, MagnitudeType::Ms, Some('E'), ms_window);
            let delta = north.or(east).map(|(o, _)| o.delta);
            if let Some(delta) = delta {
                let n_at = north.map(|(_, a)| a.amplitude / a.period).unwrap_or(0.0);
                let e_at = east.map(|(_, a)| a.amplitude / a.period).unwrap_or(0.0);
                let horizontal_at = (n_at * n_at + e_at * e_at).sqrt();
                if let Some(value) = ms_value(horizontal_at, delta) {
                    out.push(ReadingMagnitude { mag_type: MagnitudeType::Ms, station: station.clone(), agency: agency.clone(), value });
                }
            }
        }
    }

    out
}

/// Medians reading magnitudes sharing a (station, type) key into one
/// [`StationMagnitude`], in first-seen station order.
pub fn station_magnitudes(readings: &[ReadingMagnitude]) -> Vec<StationMagnitude> {
    let mut order: Vec<(MagnitudeType, String)> = Vec::new();
    let mut groups: HashMap<(MagnitudeType, String), Vec<f64>> = HashMap::new();

    for r in readings {
        let key = (r.mag_type, r.station.clone());
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(r.value);
    }

    order
        .into_iter()
        .map(|key| {
            let values = &groups[&key];
            StationMagnitude {
                mag_type: key.0,
                station: key.1,
                value: median(values),
                num_readings: values.len(),
            }
        })
        .collect()
}

/// 20%-trimmed median and MAD-derived uncertainty over `values`, paired
/// with a tie-break key so two equal magnitudes sort deterministically by
/// station: drops the lowest and highest 20% (by count) before computing
/// the median/MAD of what remains, e.g. 12 stations drops 2 lowest and 2
/// highest.
fn trimmed_median_mad(mut values: Vec<(String, f64)>) -> (f64, f64, usize) {
    values.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then_with(|| a.0.cmp(&b.0)));
    let n = values.len();
    let trim = ((n as f64) * 0.2).floor() as usize;
    let kept: Vec<f64> = if n > 2 * trim {
        values[trim..n - trim].iter().map(|(_, v)| *v).collect()
    } else {
        values.iter().map(|(_, v)| *v).collect()
    };
    let med = median(&kept);
    let deviations: Vec<f64> = kept.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations) * MAD_TO_SIGMA;
    (med, mad, kept.len())
}

/// Aggregates station magnitudes into one [`NetworkMagnitude`] per type
/// that reaches `min_netmag_sta` contributing stations.
pub fn network_magnitudes(stations: &[StationMagnitude], cfg: &Config) -> Vec<NetworkMagnitude> {
    let mut by_type: HashMap<MagnitudeType, Vec<(String, f64)>> = HashMap::new();
    let mut order = Vec::new();
    for s in stations {
        if !by_type.contains_key(&s.mag_type) {
            order.push(s.mag_type);
        }
        by_type.entry(s.mag_type).or_default().push((s.station.clone(), s.value));
    }

    order
        .into_iter()
        .filter_map(|mag_type| {
            let values = by_type.remove(&mag_type)?;
            if values.len() < cfg.magnitude.min_netmag_sta {
                return None;
            }
            let (value, uncertainty, num_stations) = trimmed_median_mad(values);
            Some(NetworkMagnitude { mag_type, value, uncertainty, num_stations })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DepthFixType, Hypo};

    #[test]
    fn ml_attenuation_matches_hutton_boore_reference_point() {
        let got = ml_attenuation(100.0);
        assert!((got - 3.0).abs() < 1e-9);
    }

    #[test]
    fn trimmed_median_drops_outliers() {
        let values: Vec<(String, f64)> = (0..12)
            .map(|i| (format!("S{i}"), i as f64))
            .collect();
        let (med, _mad, kept) = trimmed_median_mad(values);
        assert_eq!(kept, 8);
        assert!((med - 5.5).abs() < 1e-9);
    }

    #[test]
    fn station_magnitudes_group_by_station_and_type() {
        let readings = vec![
            ReadingMagnitude { mag_type: MagnitudeType::Mb, station: "AAA".into(), agency: "ISC".into(), value: 4.0 },
            ReadingMagnitude { mag_type: MagnitudeType::Mb, station: "AAA".into(), agency: "ISC".into(), value: 4.2 },
            ReadingMagnitude { mag_type: MagnitudeType::Mb, station: "BBB".into(), agency: "ISC".into(), value: 4.5 },
        ];
        let stations = station_magnitudes(&readings);
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].num_readings, 2);
    }

    #[test]
    fn network_magnitude_requires_minimum_stations() {
        let stations = vec![StationMagnitude {
            mag_type: MagnitudeType::Ms,
            station: "AAA".into(),
            value: 5.0,
            num_readings: 1,
        }];
        let cfg = Config::teleseismic();
        let net = network_magnitudes(&stations, &cfg);
        assert!(net.is_empty());
    }

    #[test]
    fn twelve_station_ms_network_magnitude_is_5_35() {
        let values = [4.8, 4.9, 5.0, 5.1, 5.2, 5.3, 5.4, 5.5, 5.6, 5.7, 5.8, 5.9];
        let stations: Vec<StationMagnitude> = values
            .iter()
            .enumerate()
            .map(|(i, v)| StationMagnitude {
                mag_type: MagnitudeType::Ms,
                station: format!("STA{i}"),
                value: *v,
                num_readings: 1,
            })
            .collect();
        let cfg = Config::teleseismic();
        let net = network_magnitudes(&stations, &cfg);
        let ms = net.iter().find(|m| m.mag_type == MagnitudeType::Ms).unwrap();
        assert!((ms.value - 5.35).abs() < 1e-9);
        assert_eq!(ms.num_stations, 8);
    }

    fn amp(amplitude: f64, period: f64, component: char, mag_type: MagnitudeType) -> Amp {
        Amp { amplitude, period, component, channel: "BHZ".into(), snr: None, mag_type, station_magnitude: None, defining: true }
    }

    fn obs_with_amp(station: &str, phase: &str, delta: f64, amps: Vec<Amp>) -> Obs {
        Obs {
            station: station.into(),
            agency: "ISC".into(),
            sta_lat: 0.0,
            sta_lon: 0.0,
            sta_elevation_m: 0.0,
            reported_phase: phase.into(),
            phase: phase.into(),
            time: None,
            azimuth: None,
            slowness: None,
            deltim: 1.0,
            delaz: 10.0,
            delslo: 1.0,
            defining: crate::model::Defining::default(),
            is_first_arrival: false,
            is_duplicate: false,
            delta,
            esaz: 0.0,
            seaz: 0.0,
            predicted_ttime: None,
            dtdd: None,
            dtdh: None,
            d2tdd2: None,
            d2tdh2: None,
            bounce_delta: None,
            tt_model: None,
            time_residual: None,
            azimuth_residual: None,
            slowness_residual: None,
            covariance_index: None,
            amplitudes: amps,
        }
    }

    #[test]
    fn ms_combines_best_north_and_east_horizontal_amplitudes() {
        let obs = vec![obs_with_amp(
            "AAA",
            "LR",
            40.0,
            vec![
                amp(400.0, 20.0, 'N', MagnitudeType::Ms),
                amp(300.0, 20.0, 'E', MagnitudeType::Ms),
                // a vertical amplitude on the same reading must not leak into MS.
                amp(9999.0, 20.0, 'Z', MagnitudeType::Ms),
            ],
        )];
        let sol = Sol::from_hypo(Hypo::seed(0.0, 0.0, 0.0, 10.0), 4, DepthFixType::Free);
        let cfg = Config::teleseismic();
        let tables = empty_tables();
        let readings = reading_magnitudes(&obs, &sol, &tables, &cfg);
        let ms = readings.iter().find(|r| r.mag_type == MagnitudeType::Ms).expect("MS reading magnitude");
        let expected_at = ((400.0f64 / 20.0).powi(2) + (300.0f64 / 20.0).powi(2)).sqrt();
        let expected = expected_at.log10() + 1.66 * 40.0f64.log10() + 0.3;
        assert!((ms.value - expected).abs() < 1e-9);
    }

    #[test]
    fn mb_picks_the_amplitude_maximising_a_over_t_on_the_vertical_component() {
        let obs = vec![obs_with_amp(
            "AAA",
            "P",
            40.0,
            vec![
                amp(100.0, 1.0, 'Z', MagnitudeType::Mb),
                amp(150.0, 1.0, 'Z', MagnitudeType::Mb),
                amp(9999.0, 1.0, 'N', MagnitudeType::Mb),
            ],
        )];
        let sol = Sol::from_hypo(Hypo::seed(0.0, 0.0, 0.0, 10.0), 4, DepthFixType::Free);
        let cfg = Config::teleseismic();
        let mut tables = empty_tables();
        tables.magnitude_q.insert(MagnitudeType::Mb, crate::tables::MagnitudeQTable::flat(1.0));
        let readings = reading_magnitudes(&obs, &sol, &tables, &cfg);
        let mb = readings.iter().find(|r| r.mag_type == MagnitudeType::Mb).expect("mb reading magnitude");
        let expected = (150.0f64 / 1.0).log10() + 1.0;
        assert!((mb.value - expected).abs() < 1e-9);
    }

    fn empty_tables() -> Tables {
        Tables {
            travel_time: crate::tables::TtTableSet::new(),
            ellipticity: crate::tables::EllipticityTableSet::new(),
            topography: crate::tables::TopographyGrid::from_bytes(&[0, 0], 1, 1, 1.0, -90.0, -180.0).unwrap(),
            region_depth: crate::tables::RegionDepthGrid::from_bytes(&[0, 0, 0, 0], 1, 1, 1.0, -90.0, -180.0).unwrap(),
            magnitude_q: HashMap::new(),
            variogram: crate::tables::Variogram { max_separation_km: 1000.0, nugget: 0.1, sill: 1.0, samples: vec![] },
            stations: HashMap::new(),
        }
    }
}
