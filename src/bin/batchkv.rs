//! batchkv Binary
//!
//! Drains a directory of job files and exits.

use std::path::PathBuf;
use std::process::ExitCode;

use batchkv::Config;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// batchkv job runner
#[derive(Parser, Debug)]
#[command(name = "batchkv")]
#[command(about = "Concurrent in-memory key-value store driven by job files")]
#[command(version)]
struct Args {
    /// Directory containing the .job files
    directory: PathBuf,

    /// Maximum number of snapshots in progress at once (0 behaves like 1)
    backup_limit: usize,

    /// Number of worker threads
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    threads: u16,
}

fn main() -> ExitCode {
    // Diagnostics go to stderr; job results only ever go to .out files
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,batchkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("batchkv v{}", batchkv::VERSION);
    tracing::info!("Job directory: {}", args.directory.display());

    let config = Config::builder()
        .job_dir(&args.directory)
        .backup_limit(args.backup_limit)
        .worker_threads(usize::from(args.threads))
        .build();

    match batchkv::process_directory(&config) {
        Ok(report) => {
            tracing::info!(
                "Processed {} jobs ({} failed, {} backups)",
                report.jobs_completed,
                report.jobs_failed,
                report.backups_started
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to process {}: {}", args.directory.display(), e);
            ExitCode::FAILURE
        }
    }
}
