use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tradeflow_clock::SystemClock;
use tradeflow_runner::{Pipeline, PipelineConfig, RunnerError};

fn print_help() {
    eprintln!(
        r#"tradeflow - trade-file ingestion pipeline

USAGE:
    tradeflow [OPTIONS] <FILE>...

Each FILE is uploaded into the dated upload folder, validated line by line,
published to the queue and staged into transactions_staging.

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    TRADEFLOW_DATA_DIR       Upload root directory (default: data)
    TRADEFLOW_TOPIC          Queue topic (default: transactions)
    TRADEFLOW_GROUP_ID       Consumer group (default: tradeflow-staging)
    TRADEFLOW_DB_PATH        DuckDB file (default: data/warehouse.duckdb)
    TRADEFLOW_STORE_BACKEND  duckdb | memory (default: duckdb)
    RUST_LOG                 Log level filter (default: info)

EXAMPLES:
    # Ingest one file with defaults
    tradeflow trades.csv

    # Run with config file
    tradeflow --config tradeflow.json trades-*.csv
"#
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut files: Vec<PathBuf> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    return ExitCode::FAILURE;
                }
                config_path = Some(args[i].clone());
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                return ExitCode::FAILURE;
            }
            file => files.push(PathBuf::from(file)),
        }
        i += 1;
    }

    if files.is_empty() {
        eprintln!("Error: no input files");
        print_help();
        return ExitCode::FAILURE;
    }

    match run(config_path, files).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every file was accepted
async fn run(config_path: Option<String>, files: Vec<PathBuf>) -> Result<bool, RunnerError> {
    let mut config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            PipelineConfig::from_file(&path)?
        }
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides()?;

    let pipeline = Pipeline::start(config, Arc::new(SystemClock::new()))?;

    let mut all_accepted = true;
    for file in &files {
        match pipeline.upload_file(file).await {
            Ok(stored) => log::info!("Accepted {} as {}", file.display(), stored.display()),
            Err(e) => {
                log::error!("{}", e);
                all_accepted = false;
            }
        }
    }

    let summary = pipeline.shutdown().await?;
    for report in &summary.files {
        if let Some(error) = &report.read_error {
            log::error!("{} was not fully read: {}", report.path.display(), error);
            all_accepted = false;
        }
    }
    Ok(all_accepted)
}
