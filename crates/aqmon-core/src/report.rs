use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::WindowSummary;

pub const REPORT_FILE_NAME: &str = "relatorio.html";
pub const REPORT_WINDOW_DAYS: u32 = 2;
pub const STATION_NAME: &str = "Estação Qt - Bom Retiro (Fazenda)";

const NO_EXCEEDANCE_MESSAGE: &str = "no limit exceeded";
const NO_ANOMALY_MESSAGE: &str = "no occurrences to report";
const NO_DATA_MESSAGE: &str = "no data in the selected window";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write report to '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Plain-text rendition of a window summary, used by the CLI.
pub fn render_text(summary: &WindowSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Daily report - {STATION_NAME}");

    match (summary.window_start, summary.window_end) {
        (Some(start), Some(end)) => {
            let _ = writeln!(
                out,
                "Ref.: {} to {} ({}-day window)",
                start.format(TIME_FORMAT),
                end.format(TIME_FORMAT),
                summary.days,
            );
        }
        _ => {
            let _ = writeln!(out, "Ref.: {NO_DATA_MESSAGE} ({}-day window)", summary.days);
        }
    }
    let _ = writeln!(
        out,
        "Rows: {} in window, {} fully valid, {} valid or in scheduled maintenance",
        summary.total_rows, summary.fully_valid_rows, summary.valid_or_maintenance_rows,
    );

    let _ = writeln!(out, "\nAir quality standard (CONAMA 506/2024):");
    if summary.exceedances.is_empty() {
        let _ = writeln!(out, "  {NO_EXCEEDANCE_MESSAGE}");
    } else {
        for exceedance in &summary.exceedances {
            let _ = writeln!(out, "  {exceedance}");
        }
    }

    let _ = writeln!(out, "\nOccurrence feedback:");
    if summary.anomalies.is_empty() {
        let _ = writeln!(out, "  {NO_ANOMALY_MESSAGE}");
    } else {
        for anomaly in &summary.anomalies {
            let _ = writeln!(out, "  {anomaly}");
        }
    }

    out
}

/// Self-contained styled HTML document for the fixed-window report. The
/// charts and PDF rendition of the station's full report are presentation
/// concerns that live outside this crate.
pub fn render_html(summary: &WindowSummary) -> String {
    let mut body = String::new();

    let period = match (summary.window_start, summary.window_end) {
        (Some(start), Some(end)) => format!(
            "Ref.: {} to {}",
            start.format(TIME_FORMAT),
            end.format(TIME_FORMAT)
        ),
        _ => format!("Ref.: {NO_DATA_MESSAGE}"),
    };
    let report_date = summary
        .window_end
        .map(|end| end.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());

    let _ = writeln!(body, "<h1>Daily report - {report_date}</h1>");
    let _ = writeln!(body, "<p class=\"period\">{period}</p>");
    let _ = writeln!(body, "<p class=\"station\">{STATION_NAME}</p>");

    let _ = writeln!(body, "<h2>Air quality standard (CONAMA 506/2024)</h2>");
    if summary.exceedances.is_empty() {
        let _ = writeln!(body, "<div class=\"ok\">{NO_EXCEEDANCE_MESSAGE}</div>");
    } else {
        for exceedance in &summary.exceedances {
            let _ = writeln!(body, "<div class=\"alert\">{exceedance}</div>");
        }
    }

    let _ = writeln!(body, "<h2>Occurrence feedback</h2>");
    if summary.anomalies.is_empty() {
        let _ = writeln!(body, "<div class=\"ok\">{NO_ANOMALY_MESSAGE}</div>");
    } else {
        for anomaly in &summary.anomalies {
            let _ = writeln!(body, "<div class=\"warn\">{anomaly}</div>");
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Daily air quality report</title>\n<style>{REPORT_CSS}</style>\n</head>\n\
         <body>\n{body}</body>\n</html>\n"
    )
}

const REPORT_CSS: &str = "\
body { font-family: sans-serif; margin: 2em; }\n\
h1 { font-size: 24px; margin-bottom: 0; }\n\
.period { color: #0072b5; font-size: 18px; margin: 4px 0; }\n\
.station { font-weight: bold; margin: 4px 0 16px 0; }\n\
h2 { font-size: 16px; margin-bottom: 6px; }\n\
.alert { background-color: #ffdddd; padding: 3px; border-radius: 5px; margin: 2px 0; }\n\
.warn { background-color: #ffcccc; padding: 2px; border-radius: 1px; margin: 2px 0; }\n\
.ok { background-color: #ddffdd; padding: 3px; border-radius: 5px; margin: 2px 0; }\n";

/// Write `relatorio.html` into `dir`, creating the directory if needed.
/// A failure here leaves the summary itself untouched.
pub fn write_html_report(summary: &WindowSummary, dir: &Path) -> Result<PathBuf, RenderError> {
    let html = render_html(summary);
    let path = dir.join(REPORT_FILE_NAME);

    fs::create_dir_all(dir).map_err(|source| RenderError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    fs::write(&path, html).map_err(|source| RenderError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(path)
}
