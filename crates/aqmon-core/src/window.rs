use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::loader::TIMESTAMP_COLUMN;

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 365;

const MICROS_PER_DAY: i64 = 24 * 60 * 60 * 1_000_000;

/// Slice the reading table to the trailing `days`-day window: rows with
/// `timestamp >= max(timestamp) - days`. An empty table stays empty.
pub fn select_window(df: &DataFrame, days: u32) -> Result<DataFrame> {
    if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
        return Err(PipelineError::InvalidDayWindow {
            min: MIN_DAYS,
            max: MAX_DAYS,
            got: days,
        });
    }

    if df.height() == 0 {
        return Ok(df.clone());
    }

    let ts = df.column(TIMESTAMP_COLUMN)?.datetime()?;
    let Some(latest) = ts.into_iter().flatten().max() else {
        return Ok(df.head(Some(0)));
    };
    let cutoff = latest - i64::from(days) * MICROS_PER_DAY;

    let mask: BooleanChunked = ts
        .into_iter()
        .map(|value| value.map(|micros| micros >= cutoff))
        .collect();
    Ok(df.filter(&mask)?)
}
