//! CLI entry point for the roadmap rollup tool.
//!
//! Loads the roadmap and catalog feeds (local files or URLs), builds the
//! immutable dataset, and emits KPI + summary tables, dimension listings,
//! or per-client geo points.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roadmap_rollup::analyzers::{geo, summary};
use roadmap_rollup::config::DatasetConfig;
use roadmap_rollup::dataset::{Dataset, RowFilter};
use roadmap_rollup::fetch::{BasicClient, fetch_text};
use roadmap_rollup::output::{print_json, write_json, write_points_csv, write_table_csv};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "roadmap_rollup")]
#[command(about = "Aggregates roadmap deliveries by channel, center, and weight range", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Roadmap feed: file path or URL. Defaults to $ROADMAP_CSV_URL.
    #[arg(long)]
    roadmap: Option<String>,

    /// Client catalog feed: file path or URL. Defaults to $CATALOG_CSV_URL.
    #[arg(long)]
    catalog: Option<String>,

    /// Optional JSON dataset config (column indices, sentinels, ranges).
    #[arg(long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full report: KPI card plus channel, center, and
    /// weight-range tables
    Report {
        #[command(flatten)]
        sources: SourceArgs,

        /// Only rows from this distribution center
        #[arg(long)]
        center: Option<String>,

        /// Only rows joined to this channel
        #[arg(long)]
        channel: Option<String>,

        /// Write report.json plus one CSV per table into this directory
        /// instead of printing JSON to stdout
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// List the distinct center and channel values available for filtering
    Dimensions {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Emit per-client weighted geo points for the heat-map view
    Geo {
        #[command(flatten)]
        sources: SourceArgs,

        /// CSV file to write the points to (stdout JSON when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/roadmap_rollup.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("roadmap_rollup.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            sources,
            center,
            channel,
            output_dir,
        } => {
            let dataset = load_dataset(&sources).await?;
            let filter = RowFilter { center, channel };
            let report = summary::report(&dataset, &filter);

            info!(
                rows = dataset.rows().len(),
                clients = report.kpis.clients,
                vehicles = report.kpis.vehicles,
                "Report built"
            );

            match output_dir {
                Some(dir) => {
                    std::fs::create_dir_all(&dir)?;
                    write_json(&format!("{dir}/report.json"), &report)?;
                    write_table_csv(&format!("{dir}/by_channel.csv"), &report.by_channel)?;
                    write_table_csv(&format!("{dir}/by_center.csv"), &report.by_center)?;
                    write_table_csv(
                        &format!("{dir}/by_weight_range.csv"),
                        &report.by_weight_range,
                    )?;
                    info!(dir = %dir, "Report written");
                }
                None => print_json(&report)?,
            }
        }
        Commands::Dimensions { sources } => {
            let dataset = load_dataset(&sources).await?;
            let listing = serde_json::json!({
                "centers": dataset.centers(),
                "channels": dataset.channels(),
            });
            print_json(&listing)?;
        }
        Commands::Geo { sources, output } => {
            let dataset = load_dataset(&sources).await?;
            if !dataset.has_geo() {
                warn!("No latitude/longitude columns resolved; geo output is empty");
            }
            let points = geo::client_points(dataset.rows());
            info!(points = points.len(), "Geo points built");

            match output {
                Some(path) => write_points_csv(&path, &points)?,
                None => print_json(&points)?,
            }
        }
    }

    Ok(())
}

/// Resolves a feed source from its CLI argument or environment fallback.
fn resolve_source(arg: Option<String>, env_var: &str) -> Result<String> {
    match arg {
        Some(source) => Ok(source),
        None => std::env::var(env_var)
            .with_context(|| format!("no feed source given and {env_var} is not set")),
    }
}

/// Loads feed text from a local file path or fetches it over HTTP.
#[tracing::instrument(skip(client), fields(source = %source))]
async fn load_source(client: &BasicClient, source: &str) -> Result<String> {
    if source.starts_with("http") {
        fetch_text(client, source).await
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading feed file {source}"))
    }
}

/// Fetches both feeds concurrently and builds the dataset. Either feed
/// failing fails the whole load; a partial dataset is never aggregated.
async fn load_dataset(sources: &SourceArgs) -> Result<Dataset> {
    let config = match &sources.config {
        Some(path) => DatasetConfig::load(path)?,
        None => DatasetConfig::default(),
    };

    let roadmap_source = resolve_source(sources.roadmap.clone(), "ROADMAP_CSV_URL")?;
    let catalog_source = resolve_source(sources.catalog.clone(), "CATALOG_CSV_URL")?;

    let client = BasicClient::new();
    let (roadmap_text, catalog_text) = tokio::try_join!(
        load_source(&client, &roadmap_source),
        load_source(&client, &catalog_source),
    )?;

    Ok(Dataset::from_text(&roadmap_text, &catalog_text, &config))
}
