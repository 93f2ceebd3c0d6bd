use std::collections::HashMap;

use polars::prelude::*;

use crate::error::Result;
use crate::loader::TIMESTAMP_COLUMN;
use crate::types::{Pollutant, RollingWindow};

const MICROS_PER_HOUR: i64 = 60 * 60 * 1_000_000;

/// Trailing rolling-average series for one pollutant, aligned pairs of
/// timestamp (micros) and mean. A mean is `None` until the window holds
/// at least the configured minimum number of finite readings.
#[derive(Debug, Clone, Default)]
pub struct RollingSeries {
    pub timestamps: Vec<i64>,
    pub values: Vec<Option<f64>>,
}

/// Compute the rolling averages for every pollutant that has a configured
/// window, over the fully-valid subset only. Keyed by the pollutant enum;
/// pollutants without a window (NO, NOX) are absent.
pub fn compute_rolling_averages(df: &DataFrame) -> Result<HashMap<Pollutant, RollingSeries>> {
    let mut averages = HashMap::new();

    if df.height() == 0 {
        for pollutant in Pollutant::ALL {
            if pollutant.rolling_window().is_some() {
                averages.insert(pollutant, RollingSeries::default());
            }
        }
        return Ok(averages);
    }

    let ts = df.column(TIMESTAMP_COLUMN)?.datetime()?;
    let timestamps: Vec<Option<i64>> = ts.into_iter().collect();

    for pollutant in Pollutant::ALL {
        let Some(window) = pollutant.rolling_window() else {
            continue;
        };
        let values: Vec<Option<f64>> = df
            .column(pollutant.value_column())?
            .f64()?
            .into_iter()
            .collect();
        averages.insert(pollutant, rolling_mean(&timestamps, &values, window));
    }

    Ok(averages)
}

/// Trailing time-window mean over rows sorted by timestamp. The window at
/// row `i` is the interval `(t_i - window, t_i]`; rows after `t_i` are
/// never consulted.
fn rolling_mean(
    timestamps: &[Option<i64>],
    values: &[Option<f64>],
    window: RollingWindow,
) -> RollingSeries {
    let window_micros = window.hours * MICROS_PER_HOUR;
    let mut out_ts = Vec::with_capacity(timestamps.len());
    let mut out_values = Vec::with_capacity(timestamps.len());

    let mut start = 0usize;
    for (idx, slot) in timestamps.iter().enumerate() {
        let Some(ts) = *slot else {
            continue;
        };

        while start < idx {
            match timestamps[start] {
                Some(t) if t > ts - window_micros => break,
                _ => start += 1,
            }
        }

        let mut sum = 0.0;
        let mut count = 0usize;
        for j in start..=idx {
            if timestamps[j].is_none() {
                continue;
            }
            if let Some(value) = values[j] {
                if value.is_finite() {
                    sum += value;
                    count += 1;
                }
            }
        }

        out_ts.push(ts);
        out_values.push(if count >= window.min_samples {
            Some(sum / count as f64)
        } else {
            None
        });
    }

    RollingSeries {
        timestamps: out_ts,
        values: out_values,
    }
}
