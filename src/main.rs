//! CLI entry point for the EV city report.
//!
//! Provides subcommands for rendering the full report, exporting the city
//! aggregate table, and printing the correlation table.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use ev_city_report::analyzers::analyzer::{PipelineContext, analyze};
use ev_city_report::charts::map::Outline;
use ev_city_report::config::ReportConfig;
use ev_city_report::output::{print_correlations, print_json, print_pretty, write_aggregates};
use ev_city_report::report::write_report;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ev_city_report")]
#[command(about = "Aggregate EV registrations by city and report on them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every subcommand.
#[derive(Args)]
struct InputArgs {
    /// Vehicle registration CSV (city, state, zip_code, base_msrp, electric_range)
    #[arg(long, value_name = "CSV")]
    vehicles: PathBuf,

    /// Postal code CSV (zip, lat, lng)
    #[arg(long, value_name = "CSV")]
    zips: PathBuf,

    /// JSON file with report settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Jurisdiction to keep, overriding the config file
    #[arg(long)]
    state: Option<String>,
}

impl InputArgs {
    fn context(&self) -> Result<PipelineContext> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::load(path)?,
            None => ReportConfig::default(),
        };
        if let Some(state) = &self.state {
            config.target_state = state.clone();
        }

        Ok(PipelineContext {
            vehicles_path: self.vehicles.clone(),
            zips_path: self.zips.clone(),
            config,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write charts, tables and report.md
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Directory to write the report into
        #[arg(short, long, default_value = "report")]
        output_dir: PathBuf,

        /// GeoJSON outline drawn under the density map
        #[arg(long, value_name = "GEOJSON")]
        outline: Option<PathBuf>,
    },
    /// Write the per-city aggregate table as CSV
    Aggregate {
        #[command(flatten)]
        input: InputArgs,

        /// CSV file to write
        #[arg(short, long, default_value = "city_aggregates.csv")]
        output: PathBuf,
    },
    /// Print the correlation table without rendering charts
    Correlate {
        #[command(flatten)]
        input: InputArgs,

        /// Also print the table, with p-values, as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ev_city_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ev_city_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            output_dir,
            outline,
        } => report(&input.context()?, &output_dir, outline.as_deref())?,
        Commands::Aggregate { input, output } => {
            let analysis = analyze(&input.context()?)?;
            print_pretty(&analysis.aggregates);
            write_aggregates(&output, &analysis.aggregates)?;
            info!(
                path = %output.display(),
                cities = analysis.aggregates.len(),
                "City aggregates written"
            );
        }
        Commands::Correlate { input, json } => {
            let analysis = analyze(&input.context()?)?;
            print_correlations(&analysis.correlations);
            if json {
                print_json(&analysis.correlations)?;
            }
        }
    }

    Ok(())
}

/// Renders the report and fails if any chart could not be drawn.
#[tracing::instrument(skip_all, fields(output_dir = %output_dir.display()))]
fn report(ctx: &PipelineContext, output_dir: &Path, outline: Option<&Path>) -> Result<()> {
    let outline = outline.map(Outline::load).transpose()?;
    let outcome = write_report(ctx, output_dir, outline.as_ref())?;

    if !outcome.failed.is_empty() {
        let failed = outcome.failed_names();
        warn!(?failed, "Some charts could not be rendered");
        bail!("failed to render charts: {}", failed.join(", "));
    }

    Ok(())
}
