use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

/// One of the seven measured pollutants. The station reports each as a
/// value column plus an integer status flag column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Pollutant {
    No,
    No2,
    Nox,
    O3,
    Co,
    So2,
    Pm10,
}

/// Trailing rolling-window configuration for a pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    pub hours: i64,
    pub min_samples: usize,
}

impl RollingWindow {
    pub const fn new(hours: i64, min_samples: usize) -> Self {
        Self {
            hours,
            min_samples,
        }
    }
}

impl Pollutant {
    pub const ALL: [Pollutant; 7] = [
        Pollutant::No,
        Pollutant::No2,
        Pollutant::Nox,
        Pollutant::O3,
        Pollutant::Co,
        Pollutant::So2,
        Pollutant::Pm10,
    ];

    /// Pollutants with a regulatory limit, in reporting order.
    pub const LIMITED: [Pollutant; 5] = [
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::Co,
        Pollutant::So2,
        Pollutant::Pm10,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::No => "NO",
            Pollutant::No2 => "NO2",
            Pollutant::Nox => "NOX",
            Pollutant::O3 => "O3",
            Pollutant::Co => "CO",
            Pollutant::So2 => "SO2",
            Pollutant::Pm10 => "PM10",
        }
    }

    /// Canonical value column in the reading table.
    pub fn value_column(&self) -> &'static str {
        match self {
            Pollutant::No => "no",
            Pollutant::No2 => "no2",
            Pollutant::Nox => "nox",
            Pollutant::O3 => "o3",
            Pollutant::Co => "co",
            Pollutant::So2 => "so2",
            Pollutant::Pm10 => "pm10",
        }
    }

    /// Canonical status flag column in the reading table.
    pub fn flag_column(&self) -> &'static str {
        match self {
            Pollutant::No => "no_flag",
            Pollutant::No2 => "no2_flag",
            Pollutant::Nox => "nox_flag",
            Pollutant::O3 => "o3_flag",
            Pollutant::Co => "co_flag",
            Pollutant::So2 => "so2_flag",
            Pollutant::Pm10 => "pm10_flag",
        }
    }

    /// Value column name as exported by the station spreadsheet.
    pub fn source_value_column(&self) -> &'static str {
        self.as_str()
    }

    /// Flag column name as exported by the station spreadsheet.
    pub fn source_flag_column(&self) -> &'static str {
        match self {
            Pollutant::No => "Status_NO",
            Pollutant::No2 => "Status_NO2",
            Pollutant::Nox => "Status_NOX",
            Pollutant::O3 => "Status_O3",
            Pollutant::Co => "Status_CO",
            Pollutant::So2 => "Status_SO2",
            Pollutant::Pm10 => "Status_PM10",
        }
    }

    /// Rolling-average configuration, for the pollutants that have one.
    /// The minimum sample counts keep under-populated windows from
    /// producing averages at all.
    pub fn rolling_window(&self) -> Option<RollingWindow> {
        match self {
            Pollutant::No2 => Some(RollingWindow::new(1, 1)),
            Pollutant::O3 | Pollutant::Co => Some(RollingWindow::new(8, 6)),
            Pollutant::So2 | Pollutant::Pm10 => Some(RollingWindow::new(24, 18)),
            Pollutant::No | Pollutant::Nox => None,
        }
    }

    /// CONAMA 506/2024 concentration limit for the rolling average.
    pub fn regulatory_limit(&self) -> Option<f64> {
        match self {
            Pollutant::No2 => Some(250.0),
            Pollutant::O3 => Some(130.0),
            Pollutant::Co => Some(9.0),
            Pollutant::So2 => Some(50.0),
            Pollutant::Pm10 => Some(100.0),
            Pollutant::No | Pollutant::Nox => None,
        }
    }

    /// Lowest physically plausible reading. PM10 sits lower because the
    /// particulate sensor reports small negative values as noise.
    pub fn anomaly_floor(&self) -> f64 {
        match self {
            Pollutant::Pm10 => -2.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-quality status code attached to every reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityFlag {
    Valid,
    ScheduledMaintenance,
    BelowDetection,
    Calibration,
    ForceMajeure,
    UnderMaintenance,
}

impl ValidityFlag {
    pub const fn code(&self) -> i64 {
        match self {
            ValidityFlag::Valid => 1,
            ValidityFlag::ScheduledMaintenance => 4,
            ValidityFlag::BelowDetection => 0,
            ValidityFlag::Calibration => 9,
            ValidityFlag::ForceMajeure => 16,
            ValidityFlag::UnderMaintenance => 28,
        }
    }
}

impl TryFrom<i64> for ValidityFlag {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ValidityFlag::Valid),
            4 => Ok(ValidityFlag::ScheduledMaintenance),
            0 => Ok(ValidityFlag::BelowDetection),
            9 => Ok(ValidityFlag::Calibration),
            16 => Ok(ValidityFlag::ForceMajeure),
            28 => Ok(ValidityFlag::UnderMaintenance),
            other => Err(format!("unknown validity flag code '{other}'")),
        }
    }
}

/// A rolling average that broke its pollutant's regulatory limit inside
/// the selected window: the highest offending value and when it occurred.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exceedance {
    pub pollutant: Pollutant,
    pub limit: f64,
    pub max_value: f64,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for Exceedance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the station report prints every limit in µg/m³, CO included
        write!(
            f,
            "{} exceeded {} µg/m³ ({:.2}) at {}",
            self.pollutant,
            self.limit,
            self.max_value,
            self.timestamp.format("%Y-%m-%d %H:%M"),
        )
    }
}

/// Why a reading was considered physically implausible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum AnomalyKind {
    BelowFloor { floor: f64, value: f64 },
    OutsideNo2Margin { expected: f64, margin: f64, value: f64 },
}

/// One implausible reading, independent of any regulatory limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub pollutant: Pollutant,
    pub timestamp: NaiveDateTime,
    pub kind: AnomalyKind,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = self.timestamp.format("%Y-%m-%d %H:%M");
        match &self.kind {
            AnomalyKind::BelowFloor { floor, .. } => {
                write!(f, "{} below {} at {}", self.pollutant, floor, when)
            }
            AnomalyKind::OutsideNo2Margin { .. } => {
                write!(
                    f,
                    "NO2 outside the 10% margin of the NOX-NO balance at {when}"
                )
            }
        }
    }
}

/// Reading-table timestamps are stored as naive station-local microseconds.
pub fn naive_from_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}
