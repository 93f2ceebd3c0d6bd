use chrono::{Duration, NaiveDateTime};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::loader::TIMESTAMP_COLUMN;
use crate::types::{naive_from_micros, Anomaly, Exceedance};
use crate::{anomaly, exceedance, rolling, validity, window};

/// Everything one pipeline run produces for the selected day-window.
/// Recomputed from scratch on every invocation; nothing is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    pub days: u32,
    /// `window_end - days`; `None` when the window holds no rows.
    pub window_start: Option<NaiveDateTime>,
    /// Latest timestamp in the window.
    pub window_end: Option<NaiveDateTime>,
    pub total_rows: usize,
    pub fully_valid_rows: usize,
    pub valid_or_maintenance_rows: usize,
    pub exceedances: Vec<Exceedance>,
    pub anomalies: Vec<Anomaly>,
}

impl WindowSummary {
    pub fn has_data(&self) -> bool {
        self.total_rows > 0
    }
}

/// Run the full window pipeline over an already-loaded reading table:
/// day-window slice, validity split, rolling averages, exceedance and
/// anomaly detection. An empty window yields an empty summary, not an
/// error.
pub fn run_window(df: &DataFrame, days: u32) -> Result<WindowSummary> {
    let windowed = window::select_window(df, days)?;
    let fully_valid = validity::fully_valid(&windowed)?;
    let valid_or_maintenance = validity::valid_or_maintenance(&windowed)?;
    info!(
        days,
        total = windowed.height(),
        fully_valid = fully_valid.height(),
        valid_or_maintenance = valid_or_maintenance.height(),
        "selected day window"
    );

    let averages = rolling::compute_rolling_averages(&fully_valid)?;
    let exceedances = exceedance::detect_exceedances(&averages);
    let anomalies = anomaly::detect_anomalies(&fully_valid)?;
    info!(
        exceedances = exceedances.len(),
        anomalies = anomalies.len(),
        "window checks complete"
    );

    let window_end = latest_timestamp(&windowed)?;
    let window_start = window_end.map(|end| end - Duration::days(i64::from(days)));

    Ok(WindowSummary {
        days,
        window_start,
        window_end,
        total_rows: windowed.height(),
        fully_valid_rows: fully_valid.height(),
        valid_or_maintenance_rows: valid_or_maintenance.height(),
        exceedances,
        anomalies,
    })
}

fn latest_timestamp(df: &DataFrame) -> Result<Option<NaiveDateTime>> {
    if df.height() == 0 {
        return Ok(None);
    }
    let ts = df.column(TIMESTAMP_COLUMN)?.datetime()?;
    Ok(ts.into_iter().flatten().max().and_then(naive_from_micros))
}
