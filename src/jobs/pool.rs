//! Worker Pool
//!
//! A fixed set of threads draining one job source.

use crate::backup::BackupManager;
use crate::engine::Engine;
use crate::error::{KvsError, Result};

use super::{JobRunner, JobSource};

/// Totals over every worker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolReport {
    /// Jobs run to their end
    pub jobs_completed: usize,

    /// Jobs stopped by an I/O error on their own files
    pub jobs_failed: usize,

    /// Backups started across all jobs
    pub backups_started: u64,
}

impl PoolReport {
    fn merge(&mut self, other: PoolReport) {
        self.jobs_completed += other.jobs_completed;
        self.jobs_failed += other.jobs_failed;
        self.backups_started += other.backups_started;
    }
}

/// Runs `threads` workers until the source is drained
pub struct WorkerPool<'a> {
    source: &'a JobSource,
    runner: JobRunner<'a>,
    threads: usize,
}

impl<'a> WorkerPool<'a> {
    pub fn new(
        source: &'a JobSource,
        engine: &'a Engine,
        backups: &'a BackupManager,
        threads: usize,
    ) -> Self {
        Self {
            source,
            runner: JobRunner::new(engine, backups),
            threads: threads.max(1),
        }
    }

    /// Start the workers and wait for all of them
    ///
    /// Workers borrow the engine, so they are scoped threads; every worker
    /// is joined before this returns.
    pub fn run(&self) -> Result<PoolReport> {
        tracing::info!(
            "Starting {} workers on {}",
            self.threads,
            self.source.dir().display()
        );

        let outcome = crossbeam::thread::scope(|scope| -> Result<PoolReport> {
            let mut handles = Vec::with_capacity(self.threads);
            for id in 0..self.threads {
                let handle = scope
                    .builder()
                    .name(format!("kvs-worker-{}", id))
                    .spawn(move |_| self.worker_loop(id))?;
                handles.push(handle);
            }

            let mut report = PoolReport::default();
            for handle in handles {
                let worker = handle.join().map_err(|_| KvsError::WorkerPanicked)?;
                report.merge(worker);
            }
            Ok(report)
        });

        let report = outcome.map_err(|_| KvsError::WorkerPanicked)??;
        tracing::info!(
            "All workers finished: {} jobs completed, {} failed",
            report.jobs_completed,
            report.jobs_failed
        );
        Ok(report)
    }

    /// Claim and run jobs until none are left
    fn worker_loop(&self, id: usize) -> PoolReport {
        let mut report = PoolReport::default();

        while let Some(job) = self.source.claim_next() {
            let path = job.input_path().to_path_buf();
            match self.runner.run(job) {
                Ok(job_report) => {
                    report.jobs_completed += 1;
                    report.backups_started += u64::from(job_report.backups);
                    tracing::debug!(
                        "Worker {} finished {} ({} commands)",
                        id,
                        path.display(),
                        job_report.commands
                    );
                }
                Err(e) => {
                    report.jobs_failed += 1;
                    tracing::warn!("Job {} aborted: {}", path.display(), e);
                }
            }
        }

        tracing::debug!("Worker {} found no more jobs", id);
        report
    }
}
