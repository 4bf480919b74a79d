use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

use case_scrubber::config::{self, Config};
use case_scrubber::geocode::{AddressValidator, GoogleGeocoder};
use case_scrubber::logging;
use case_scrubber::pipeline::{orchestrator, validate};

#[derive(Parser)]
#[command(name = "case_scrubber")]
#[command(about = "Batch cleaner and address validator for county case-record exports")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean one or more record exports in place
    Clean {
        /// Spreadsheet files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory the JSON batch report is written to
        #[arg(long, default_value = "reports")]
        report_dir: PathBuf,
        /// Skip writing the JSON batch report
        #[arg(long)]
        no_report: bool,
    },
    /// Validate and enrich addresses through the geocoding service
    Validate {
        /// Spreadsheet file to validate
        file: PathBuf,
        /// Geocoding API key (falls back to the GEOCODE_API_KEY variable)
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean {
            files,
            report_dir,
            no_report,
        } => {
            println!("🧽 Running cleaning pipeline...");

            let (existing, missing): (Vec<PathBuf>, Vec<PathBuf>) =
                files.into_iter().partition(|p| p.is_file());
            if !missing.is_empty() {
                println!("\n⚠️ Skipping missing paths:");
                for path in &missing {
                    println!("   - {}", path.display());
                }
            }
            if existing.is_empty() {
                println!("❌ No files to process.");
                std::process::exit(1);
            }

            let today = Local::now().date_naive();
            let report_dir = if no_report { None } else { Some(report_dir) };
            let summary = orchestrator::clean_batch(&existing, today, report_dir.as_deref());
            if summary.failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Validate { file, api_key } => {
            println!("📍 Running address validation...");

            let config = Config::load()?;
            let key = config::resolve_api_key(api_key)?;
            let geocoder = GoogleGeocoder::new(key, &config.geocoder)?;
            let validator = AddressValidator::new(
                Box::new(geocoder),
                Duration::from_millis(config.geocoder.delay_ms),
            );

            match validate::validate_file(&file, &validator).await {
                Ok(stats) => {
                    println!(
                        "📊 {} row(s) in, {} row(s) out ({} duplicate(s), {} lookup error(s))",
                        stats.start_rows,
                        stats.end_rows,
                        stats.duplicates_removed,
                        stats.lookup_errors
                    );
                }
                Err(e) => {
                    error!("Validation failed: {}", e);
                    println!("❌ Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
