use std::path::PathBuf;

use anyhow::{Context, Result};
use aqmon_core::{loader, pipeline, report};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Air-quality station summaries and reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the exceedance and anomaly summary for a day window
    Summary(SummaryArgs),
    /// Write the fixed 2-day relatorio.html
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// Station spreadsheet; falls back to AQMON_DATA_FILE
    #[arg(long)]
    input: Option<PathBuf>,

    /// Day window to inspect
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=365))]
    days: u32,

    /// Emit the summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Station spreadsheet; falls back to AQMON_DATA_FILE
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory receiving relatorio.html
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Summary(args) => {
            let input = resolve_input(args.input)?;
            let readings = loader::load_readings(&input)?;
            let summary = pipeline::run_window(&readings, args.days)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", report::render_text(&summary));
            }
            Ok(())
        }
        Command::Report(args) => {
            let input = resolve_input(args.input)?;
            let readings = loader::load_readings(&input)?;
            let summary = pipeline::run_window(&readings, report::REPORT_WINDOW_DAYS)?;
            let written = report::write_html_report(&summary, &args.output_dir)?;
            info!(path = %written.display(), "report written");
            Ok(())
        }
    }
}

fn resolve_input(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    dotenvy::dotenv().ok();
    std::env::var("AQMON_DATA_FILE")
        .map(PathBuf::from)
        .context("pass --input or set AQMON_DATA_FILE")
}
