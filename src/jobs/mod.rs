//! Jobs Module
//!
//! Drains a directory of `.job` files with a pool of worker threads.
//!
//! ## Architecture
//! - `JobSource`: one mutex-guarded directory cursor, each job claimed once
//! - `WorkerPool`: N scoped threads, each looping claim → run
//! - `JobRunner`: one job's command stream, in file order
//! - Commands routed through `Engine` and `BackupManager`

mod pool;
mod runner;
mod source;

pub use pool::{PoolReport, WorkerPool};
pub use runner::{JobReport, JobRunner};
pub use source::{backup_path_for, job_stem, output_path_for, Job, JobSource};

use crate::backup::BackupManager;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

/// Process every job in `config.job_dir`
///
/// Opens the directory, initializes the engine, runs the pool, waits for
/// every outstanding snapshot and terminates the engine. Fails if the
/// directory cannot be opened, the engine cannot be initialized or a worker
/// panics.
pub fn process_directory(config: &Config) -> Result<PoolReport> {
    config.validate()?;

    let source = JobSource::open(&config.job_dir)?;
    let engine = Engine::open(config.table_size)?;
    let backups = BackupManager::new(config.backup_limit);

    let report = WorkerPool::new(&source, &engine, &backups, config.worker_threads).run();

    // Snapshots hold their own copy of the table but must finish before exit
    let exits = backups.wait_all();
    engine.terminate()?;

    let report = report?;
    let failed = exits?.iter().filter(|exit| !exit.is_success()).count();
    if failed > 0 {
        tracing::warn!("{} snapshots failed", failed);
    }

    Ok(report)
}
