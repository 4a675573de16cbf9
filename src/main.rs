use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};
use xray_prep::{fetch, relabel, resize, PrepError};

/// Prepare the CoronaHack chest X-ray dataset for model training
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the dataset archive and copy it into a working directory
    Fetch(fetch::FetchArgs),
    /// Classify metadata rows by diagnosis and write a filtered copy
    Relabel(relabel::RelabelArgs),
    /// Resize every image under a directory tree to a uniform size
    Resize(resize::ResizeArgs),
}

fn init_logging(level: &str) {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.parse_filters(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    match args.command {
        Commands::Fetch(fetch_args) => match fetch::fetch_dataset(&fetch_args).await {
            Ok(report) => {
                if report.is_complete() {
                    info!(
                        "Dataset ready in {} ({} artifacts copied)",
                        fetch_args.path.display(),
                        report.copied.len()
                    );
                } else {
                    warn!(
                        "Dataset copied with {} failure(s); {} may be incomplete",
                        report.failures.len(),
                        fetch_args.path.display()
                    );
                    for failure in &report.failures {
                        warn!("  {}: {}", failure.artifact.display(), failure.error);
                    }
                }
            }
            Err(e) => {
                error!("Error fetching dataset: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Relabel(relabel_args) => {
            if let Err(e) = relabel::relabel_file(&relabel_args) {
                error!("Error relabeling metadata: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Resize(resize_args) => match resize::run(&resize_args) {
            Ok(summary) => {
                for skipped in &summary.skipped {
                    debug!("Skipped {} ({})", skipped.path.display(), skipped.reason);
                }
            }
            Err(e @ PrepError::MissingInput(_)) => {
                error!("{}", e);
                error!("Make sure the path is correct and the directory exists.");
                std::process::exit(1);
            }
            Err(e) => {
                error!("Error during resizing: {}", e);
                std::process::exit(1);
            }
        },
    }
}
