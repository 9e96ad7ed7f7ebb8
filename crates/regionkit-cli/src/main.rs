//! RegionKit CLI - inspect the INE province catalog and clean region names

use clap::{Parser, Subcommand, ValueEnum};
use regionkit::{CatalogBuilder, MatchReport, RegionCatalog, DEFAULT_THRESHOLD, DEFAULT_URL};
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Output format for the show subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON format
    Json,
}

/// RegionKit - INE autonomous community / province catalog
#[derive(Parser, Debug)]
#[command(name = "regionkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Page to load the table from
    #[arg(long, global = true, default_value = DEFAULT_URL)]
    url: String,

    /// Custom User-Agent
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Comma-separated column names to use instead of the defaults
    #[arg(long, global = true, value_delimiter = ',')]
    columns: Option<Vec<String>>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the table and print a summary
    Show {
        /// Output format
        #[arg(long, short, default_value = "text")]
        output: OutputFormat,
    },
    /// Map noisy values onto the canonical values of a column
    Match {
        /// Reference column
        #[arg(long, short)]
        column: String,

        /// Minimum similarity (0-100) for a replacement
        #[arg(long, short, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Print the full match report as JSON
        #[arg(long)]
        json: bool,

        /// Values to normalize
        #[arg(required = true)]
        values: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = builder_from_cli(&cli).load().await;

    match cli.command {
        Commands::Show { output } => run_show(&catalog, output),
        Commands::Match {
            column,
            threshold,
            json,
            values,
        } => run_match(&catalog, &column, threshold, json, &values),
    }
}

fn builder_from_cli(cli: &Cli) -> CatalogBuilder {
    let mut builder = RegionCatalog::builder()
        .url(cli.url.clone())
        .request_timeout(Duration::from_secs(cli.timeout));

    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    if let Some(ref columns) = cli.columns {
        builder = builder.column_names(columns.iter().cloned());
    }
    builder
}

fn run_show(catalog: &RegionCatalog, output: OutputFormat) {
    match output {
        OutputFormat::Text => writeln_safe(&catalog.to_string()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(catalog).unwrap_or_else(|e| {
                eprintln!("Error serializing catalog: {}", e);
                std::process::exit(1);
            });
            writeln_safe(&json);
        }
    }
    if catalog.table().is_none() {
        std::process::exit(1);
    }
}

fn run_match(catalog: &RegionCatalog, column: &str, threshold: f64, json: bool, values: &[String]) {
    match catalog.normalize_values(column, values, threshold) {
        Ok(report) if json => {
            let json = serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
                eprintln!("Error serializing report: {}", e);
                std::process::exit(1);
            });
            writeln_safe(&json);
        }
        Ok(report) => writeln_safe(&format_values(&report)),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// One output value per line, in input order
fn format_values(report: &MatchReport) -> String {
    report.values.join("\n")
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
