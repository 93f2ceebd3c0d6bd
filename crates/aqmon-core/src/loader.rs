use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use chrono::NaiveDateTime;
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::types::{Pollutant, ValidityFlag};

pub const SHEET_NAME: &str = "COCA";
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const SOURCE_TIMESTAMP_COLUMN: &str = "Date_Time";

const POLLUTANT_COUNT: usize = Pollutant::ALL.len();

static TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to open workbook '{path}': {source}")]
    Workbook {
        path: String,
        #[source]
        source: XlsxError,
    },

    #[error("workbook has no sheet named '{0}'")]
    MissingSheet(String),

    #[error("sheet '{sheet}' has no header row")]
    EmptySheet { sheet: String },

    #[error("sheet '{sheet}' is missing required column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("row {row}: invalid timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("row {row}, column '{column}': expected a number, found '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}, column '{column}': unknown validity flag code {code}")]
    UnknownFlag {
        row: usize,
        column: String,
        code: i64,
    },

    #[error("failed to assemble the reading table: {0}")]
    Polars(#[from] PolarsError),
}

/// Read the station sheet into the canonical reading table: a `timestamp`
/// column (naive microseconds, ascending) plus one value and one flag
/// column per pollutant. Pure read, nothing is cached or mutated.
pub fn load_readings(path: &Path) -> Result<DataFrame, DataLoadError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|source| DataLoadError::Workbook {
            path: path.display().to_string(),
            source,
        })?;
    let range = workbook
        .worksheet_range(SHEET_NAME)
        .map_err(|_| DataLoadError::MissingSheet(SHEET_NAME.to_string()))?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| DataLoadError::EmptySheet {
        sheet: SHEET_NAME.to_string(),
    })?;
    let columns = resolve_columns(SHEET_NAME, header)?;

    let mut timestamps: Vec<i64> = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); POLLUTANT_COUNT];
    let mut flags: Vec<Vec<Option<i64>>> = vec![Vec::new(); POLLUTANT_COUNT];

    let empty = Data::Empty;
    for (offset, row) in rows.enumerate() {
        let row_number = offset + 2; // 1-based, after the header row
        let cell = row.get(columns.timestamp).unwrap_or(&empty);
        let Some(ts) = parse_timestamp_cell(cell, row_number)? else {
            // exported sheets often trail off in blank rows
            continue;
        };
        timestamps.push(ts);

        for (slot, pollutant) in Pollutant::ALL.iter().enumerate() {
            let value_cell = row.get(columns.values[slot]).unwrap_or(&empty);
            values[slot].push(parse_value_cell(
                value_cell,
                row_number,
                pollutant.source_value_column(),
            )?);

            let flag_cell = row.get(columns.flags[slot]).unwrap_or(&empty);
            flags[slot].push(parse_flag_cell(
                flag_cell,
                row_number,
                pollutant.source_flag_column(),
            )?);
        }
    }

    // downstream stages assume timestamp-ascending order
    let mut order: Vec<usize> = (0..timestamps.len()).collect();
    order.sort_by_key(|&idx| timestamps[idx]);

    let sorted_ts: Vec<i64> = order.iter().map(|&idx| timestamps[idx]).collect();
    let ts_series = Series::new(TIMESTAMP_COLUMN.into(), sorted_ts)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let mut cols: Vec<Column> = Vec::with_capacity(1 + 2 * POLLUTANT_COUNT);
    cols.push(ts_series.into());
    for (slot, pollutant) in Pollutant::ALL.iter().enumerate() {
        let sorted_values: Vec<Option<f64>> =
            order.iter().map(|&idx| values[slot][idx]).collect();
        cols.push(Series::new(pollutant.value_column().into(), sorted_values).into());

        let sorted_flags: Vec<Option<i64>> = order.iter().map(|&idx| flags[slot][idx]).collect();
        cols.push(Series::new(pollutant.flag_column().into(), sorted_flags).into());
    }

    let df = DataFrame::new(cols)?;
    debug!(rows = df.height(), "loaded station readings");
    Ok(df)
}

#[derive(Debug)]
struct ColumnIndex {
    timestamp: usize,
    values: [usize; POLLUTANT_COUNT],
    flags: [usize; POLLUTANT_COUNT],
}

fn resolve_columns(sheet: &str, header: &[Data]) -> Result<ColumnIndex, DataLoadError> {
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for (idx, cell) in header.iter().enumerate() {
        if let Data::String(name) = cell {
            index_of.insert(name.trim(), idx);
        }
    }

    let lookup = |column: &'static str| {
        index_of
            .get(column)
            .copied()
            .ok_or_else(|| DataLoadError::MissingColumn {
                sheet: sheet.to_string(),
                column: column.to_string(),
            })
    };

    let timestamp = lookup(SOURCE_TIMESTAMP_COLUMN)?;
    let mut values = [0usize; POLLUTANT_COUNT];
    let mut flags = [0usize; POLLUTANT_COUNT];
    for (slot, pollutant) in Pollutant::ALL.iter().enumerate() {
        values[slot] = lookup(pollutant.source_value_column())?;
        flags[slot] = lookup(pollutant.source_flag_column())?;
    }

    Ok(ColumnIndex {
        timestamp,
        values,
        flags,
    })
}

fn parse_timestamp_cell(cell: &Data, row: usize) -> Result<Option<i64>, DataLoadError> {
    match cell {
        Data::Empty => Ok(None),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(parsed) => Ok(Some(parsed.and_utc().timestamp_micros())),
            None => Err(DataLoadError::InvalidTimestamp {
                row,
                value: cell.to_string(),
            }),
        },
        Data::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            for fmt in TIMESTAMP_FORMATS {
                if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                    return Ok(Some(parsed.and_utc().timestamp_micros()));
                }
            }
            Err(DataLoadError::InvalidTimestamp {
                row,
                value: trimmed.to_string(),
            })
        }
        other => Err(DataLoadError::InvalidTimestamp {
            row,
            value: other.to_string(),
        }),
    }
}

fn parse_value_cell(
    cell: &Data,
    row: usize,
    column: &'static str,
) -> Result<Option<f64>, DataLoadError> {
    match cell {
        Data::Empty => Ok(None),
        Data::Float(value) => Ok(Some(*value)),
        Data::Int(value) => Ok(Some(*value as f64)),
        Data::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| DataLoadError::InvalidNumber {
                    row,
                    column: column.to_string(),
                    value: trimmed.to_string(),
                })
        }
        other => Err(DataLoadError::InvalidNumber {
            row,
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_flag_cell(
    cell: &Data,
    row: usize,
    column: &'static str,
) -> Result<Option<i64>, DataLoadError> {
    let code = match cell {
        Data::Empty => return Ok(None),
        Data::Int(value) => *value,
        Data::Float(value) if value.fract() == 0.0 => *value as i64,
        Data::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map_err(|_| DataLoadError::InvalidNumber {
                    row,
                    column: column.to_string(),
                    value: trimmed.to_string(),
                })?
        }
        other => {
            return Err(DataLoadError::InvalidNumber {
                row,
                column: column.to_string(),
                value: other.to_string(),
            })
        }
    };

    // flags come from a closed set; anything else is a corrupt export
    ValidityFlag::try_from(code).map_err(|_| DataLoadError::UnknownFlag {
        row,
        column: column.to_string(),
        code,
    })?;

    Ok(Some(code))
}
