use polars::prelude::*;

use crate::error::Result;
use crate::loader::TIMESTAMP_COLUMN;
use crate::types::{naive_from_micros, Anomaly, AnomalyKind, Pollutant};

const NO2_MARGIN_FRACTION: f64 = 0.1;

/// Flag physically implausible readings in the fully-valid subset:
/// concentrations below the per-pollutant floor, and NO2 readings outside
/// ±10% of the NOX − NO balance. Rows with nulls in the inputs of a check
/// are skipped. The result is timestamp-ascending.
pub fn detect_anomalies(df: &DataFrame) -> Result<Vec<Anomaly>> {
    let mut anomalies = Vec::new();
    if df.height() == 0 {
        return Ok(anomalies);
    }

    let len = df.height();
    let ts = df.column(TIMESTAMP_COLUMN)?.datetime()?;

    for pollutant in Pollutant::ALL {
        let floor = pollutant.anomaly_floor();
        let values = df.column(pollutant.value_column())?.f64()?;
        for idx in 0..len {
            let (Some(ts_micros), Some(value)) = (ts.get(idx), values.get(idx)) else {
                continue;
            };
            if value < floor {
                if let Some(timestamp) = naive_from_micros(ts_micros) {
                    anomalies.push(Anomaly {
                        pollutant,
                        timestamp,
                        kind: AnomalyKind::BelowFloor { floor, value },
                    });
                }
            }
        }
    }

    let no = df.column(Pollutant::No.value_column())?.f64()?;
    let no2 = df.column(Pollutant::No2.value_column())?.f64()?;
    let nox = df.column(Pollutant::Nox.value_column())?.f64()?;
    for idx in 0..len {
        let (Some(ts_micros), Some(no), Some(no2), Some(nox)) =
            (ts.get(idx), no.get(idx), no2.get(idx), nox.get(idx))
        else {
            continue;
        };

        let expected = nox - no;
        let margin = NO2_MARGIN_FRACTION * expected;
        if no2 < expected - margin || no2 > expected + margin {
            if let Some(timestamp) = naive_from_micros(ts_micros) {
                anomalies.push(Anomaly {
                    pollutant: Pollutant::No2,
                    timestamp,
                    kind: AnomalyKind::OutsideNo2Margin {
                        expected,
                        margin,
                        value: no2,
                    },
                });
            }
        }
    }

    anomalies.sort_by_key(|anomaly| anomaly.timestamp);
    Ok(anomalies)
}
