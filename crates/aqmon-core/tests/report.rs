use std::fs;

use aqmon_core::pipeline::WindowSummary;
use aqmon_core::report::{render_html, render_text, write_html_report, REPORT_FILE_NAME};
use aqmon_core::types::{Anomaly, AnomalyKind, Exceedance, Pollutant};
use chrono::NaiveDate;

fn summary_with_findings() -> WindowSummary {
    let at = NaiveDate::from_ymd_opt(2024, 1, 9)
        .unwrap()
        .and_hms_opt(13, 0, 0)
        .unwrap();
    WindowSummary {
        days: 2,
        window_start: NaiveDate::from_ymd_opt(2024, 1, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0),
        window_end: NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0),
        total_rows: 48,
        fully_valid_rows: 40,
        valid_or_maintenance_rows: 44,
        exceedances: vec![Exceedance {
            pollutant: Pollutant::No2,
            limit: 250.0,
            max_value: 312.4,
            timestamp: at,
        }],
        anomalies: vec![Anomaly {
            pollutant: Pollutant::Pm10,
            timestamp: at,
            kind: AnomalyKind::BelowFloor {
                floor: -2.0,
                value: -3.0,
            },
        }],
    }
}

fn empty_summary() -> WindowSummary {
    WindowSummary {
        days: 2,
        window_start: None,
        window_end: None,
        total_rows: 0,
        fully_valid_rows: 0,
        valid_or_maintenance_rows: 0,
        exceedances: Vec::new(),
        anomalies: Vec::new(),
    }
}

#[test]
fn html_report_carries_the_findings() {
    let html = render_html(&summary_with_findings());

    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("<h1>Daily report - 2024-01-10</h1>"));
    assert!(html.contains("NO2 exceeded 250 µg/m³ (312.40) at 2024-01-09 13:00"));
    assert!(html.contains("PM10 below -2 at 2024-01-09 13:00"));
    assert!(html.contains("class=\"alert\""));
    assert!(html.contains("CONAMA 506/2024"));
}

#[test]
fn html_report_degrades_without_findings() {
    let html = render_html(&empty_summary());

    assert!(html.contains("no limit exceeded"));
    assert!(html.contains("no occurrences to report"));
    assert!(html.contains("no data in the selected window"));
    assert!(!html.contains("class=\"alert\""));
}

#[test]
fn text_header_and_units_match_the_station_format() {
    let mut summary = summary_with_findings();
    summary.exceedances = vec![Exceedance {
        pollutant: Pollutant::Co,
        limit: 9.0,
        max_value: 9.6,
        timestamp: NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap(),
    }];

    let text = render_text(&summary);
    // plain hyphen in the header, and µg/m³ for every pollutant, CO included
    assert!(text.starts_with("Daily report - Estação Qt"));
    assert!(text.contains("CO exceeded 9 µg/m³ (9.60) at 2024-01-09 13:00"));
}

#[test]
fn report_file_lands_in_the_output_directory() {
    let dir = std::env::temp_dir().join(format!("aqmon-report-{}", std::process::id()));
    let written = write_html_report(&summary_with_findings(), &dir).unwrap();

    assert_eq!(written.file_name().unwrap(), REPORT_FILE_NAME);
    let html = fs::read_to_string(&written).unwrap();
    assert!(html.contains("NO2 exceeded 250"));

    fs::remove_dir_all(&dir).ok();
}
