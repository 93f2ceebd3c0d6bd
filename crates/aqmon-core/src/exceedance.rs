use std::collections::HashMap;

use crate::rolling::RollingSeries;
use crate::types::{naive_from_micros, Exceedance, Pollutant};

/// Scan the rolling-average series of every limited pollutant for values
/// above its regulatory limit. At most one `Exceedance` per pollutant is
/// reported: the maximum offending value and when it occurred. Empty or
/// all-null series simply contribute nothing.
pub fn detect_exceedances(averages: &HashMap<Pollutant, RollingSeries>) -> Vec<Exceedance> {
    let mut exceedances = Vec::new();

    for pollutant in Pollutant::LIMITED {
        let Some(limit) = pollutant.regulatory_limit() else {
            continue;
        };
        let Some(series) = averages.get(&pollutant) else {
            continue;
        };

        let mut peak: Option<(f64, i64)> = None;
        for (ts, value) in series.timestamps.iter().zip(&series.values) {
            let Some(value) = *value else {
                continue;
            };
            if value > limit {
                match peak {
                    Some((best, _)) if best >= value => {}
                    _ => peak = Some((value, *ts)),
                }
            }
        }

        if let Some((max_value, ts_micros)) = peak {
            if let Some(timestamp) = naive_from_micros(ts_micros) {
                exceedances.push(Exceedance {
                    pollutant,
                    limit,
                    max_value,
                    timestamp,
                });
            }
        }
    }

    exceedances
}
