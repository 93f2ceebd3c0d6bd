use aqmon_core::anomaly::detect_anomalies;
use aqmon_core::loader::TIMESTAMP_COLUMN;
use aqmon_core::types::{AnomalyKind, Pollutant};
use chrono::NaiveDate;
use polars::prelude::*;

fn micros(hour: u32) -> i64 {
    NaiveDate::from_ymd_opt(2024, 1, 8)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_micros()
}

fn reading_frame(
    timestamps: &[i64],
    value_for: impl Fn(Pollutant, usize) -> Option<f64>,
) -> PolarsResult<DataFrame> {
    let ts = Series::new(TIMESTAMP_COLUMN.into(), timestamps.to_vec())
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    let mut cols: Vec<Column> = vec![ts.into()];
    for pollutant in Pollutant::ALL {
        let values: Vec<Option<f64>> = (0..timestamps.len())
            .map(|idx| value_for(pollutant, idx))
            .collect();
        cols.push(Series::new(pollutant.value_column().into(), values).into());
        cols.push(Series::new(pollutant.flag_column().into(), vec![1i64; timestamps.len()]).into());
    }
    DataFrame::new(cols)
}

/// Balanced defaults: NO=10, NOX=30, NO2=20 sits exactly on the expected
/// NOX-NO difference, so no margin anomaly fires.
fn balanced(pollutant: Pollutant) -> Option<f64> {
    match pollutant {
        Pollutant::No => Some(10.0),
        Pollutant::No2 => Some(20.0),
        Pollutant::Nox => Some(30.0),
        _ => Some(10.0),
    }
}

#[test]
fn no2_outside_ten_percent_margin_is_flagged() -> PolarsResult<()> {
    // expected NO2 = 30 - 10 = 20, margin 2, acceptable range [18, 22]
    let df = reading_frame(&[micros(12)], |pollutant, _| match pollutant {
        Pollutant::No2 => Some(15.0),
        other => balanced(other),
    })?;

    let anomalies = detect_anomalies(&df).unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].pollutant, Pollutant::No2);
    match &anomalies[0].kind {
        AnomalyKind::OutsideNo2Margin {
            expected,
            margin,
            value,
        } => {
            assert_eq!(*expected, 20.0);
            assert_eq!(*margin, 2.0);
            assert_eq!(*value, 15.0);
        }
        other => panic!("unexpected anomaly kind: {other:?}"),
    }

    Ok(())
}

#[test]
fn no2_inside_the_margin_is_clean() -> PolarsResult<()> {
    let df = reading_frame(&[micros(12)], |pollutant, _| match pollutant {
        Pollutant::No2 => Some(19.0),
        other => balanced(other),
    })?;

    assert!(detect_anomalies(&df).unwrap().is_empty());
    Ok(())
}

#[test]
fn pm10_noise_floor_sits_at_minus_two() -> PolarsResult<()> {
    let df = reading_frame(&[micros(10), micros(11)], |pollutant, idx| match pollutant {
        Pollutant::Pm10 => Some([-1.5, -3.0][idx]),
        other => balanced(other),
    })?;

    let anomalies = detect_anomalies(&df).unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].pollutant, Pollutant::Pm10);
    assert_eq!(anomalies[0].timestamp.format("%H:%M").to_string(), "11:00");
    match &anomalies[0].kind {
        AnomalyKind::BelowFloor { floor, value } => {
            assert_eq!(*floor, -2.0);
            assert_eq!(*value, -3.0);
        }
        other => panic!("unexpected anomaly kind: {other:?}"),
    }

    Ok(())
}

#[test]
fn gas_pollutants_flag_any_negative_reading() -> PolarsResult<()> {
    let df = reading_frame(&[micros(10)], |pollutant, _| match pollutant {
        Pollutant::So2 => Some(-0.1),
        other => balanced(other),
    })?;

    let anomalies = detect_anomalies(&df).unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].pollutant, Pollutant::So2);
    assert!(matches!(
        anomalies[0].kind,
        AnomalyKind::BelowFloor { floor, .. } if floor == 0.0
    ));

    Ok(())
}

#[test]
fn anomalies_come_back_timestamp_ascending() -> PolarsResult<()> {
    // negative SO2 at 14:00, PM10 below floor at 10:00, NO2 margin at 12:00
    let timestamps = [micros(10), micros(12), micros(14)];
    let df = reading_frame(&timestamps, |pollutant, idx| match (pollutant, idx) {
        (Pollutant::Pm10, 0) => Some(-5.0),
        (Pollutant::No2, 1) => Some(40.0),
        (Pollutant::So2, 2) => Some(-1.0),
        (other, _) => balanced(other),
    })?;

    let anomalies = detect_anomalies(&df).unwrap();
    assert_eq!(anomalies.len(), 3);
    let hours: Vec<String> = anomalies
        .iter()
        .map(|anomaly| anomaly.timestamp.format("%H:%M").to_string())
        .collect();
    assert_eq!(hours, vec!["10:00", "12:00", "14:00"]);

    Ok(())
}

#[test]
fn rows_with_null_inputs_are_skipped() -> PolarsResult<()> {
    let df = reading_frame(&[micros(10)], |pollutant, _| match pollutant {
        Pollutant::Nox => None,
        Pollutant::No2 => Some(500.0),
        other => balanced(other),
    })?;

    // the balance check needs NO, NO2, and NOX all present
    assert!(detect_anomalies(&df).unwrap().is_empty());
    Ok(())
}

#[test]
fn empty_window_yields_no_anomalies() -> PolarsResult<()> {
    let df = reading_frame(&[], |_, _| Some(10.0))?;
    assert!(detect_anomalies(&df).unwrap().is_empty());
    Ok(())
}
