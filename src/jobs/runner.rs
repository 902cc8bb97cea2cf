//! Job Runner
//!
//! Executes the commands of one job, in file order, on the calling thread.

use std::io::Write;
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

use crate::backup::BackupManager;
use crate::engine::Engine;
use crate::error::{KvsError, Result};
use crate::protocol::{
    write_response, Command, Response, BACKUP_FAILED, DELETE_FAILED, INVALID_COMMAND,
    READ_FAILED, WRITE_FAILED,
};

use super::Job;

/// What happened while running one job
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    /// Commands executed (blank lines and comments excluded)
    pub commands: usize,

    /// Lines rejected with the invalid-command diagnostic
    pub invalid: usize,

    /// Backups started
    pub backups: u32,
}

/// Runs jobs against a shared engine and backup manager
#[derive(Clone, Copy)]
pub struct JobRunner<'a> {
    engine: &'a Engine,
    backups: &'a BackupManager,
}

impl<'a> JobRunner<'a> {
    pub fn new(engine: &'a Engine, backups: &'a BackupManager) -> Self {
        Self { engine, backups }
    }

    /// Run `job` until its commands end, then close it
    ///
    /// Command failures are reported as diagnostics and the job goes on; an
    /// I/O error on the job's own files stops it.
    pub fn run(&self, mut job: Job) -> Result<JobReport> {
        tracing::info!("Running job {}", job.input_path().display());

        let mut report = JobReport::default();
        let outcome = self.drain(&mut job, &mut report);
        report.backups = job.backup_count();
        let closed = job.close();

        outcome?;
        closed?;
        Ok(report)
    }

    fn drain(&self, job: &mut Job, report: &mut JobReport) -> Result<()> {
        loop {
            let command = job.next_command()?;
            tracing::trace!(
                "{}:{} {:?}",
                job.input_path().display(),
                job.line_number(),
                command
            );

            if !matches!(command, Command::Empty | Command::End) {
                report.commands += 1;
            }

            if let ControlFlow::Break(()) = self.execute(job, command, report)? {
                return Ok(());
            }
        }
    }

    /// Execute one command
    fn execute(
        &self,
        job: &mut Job,
        command: Command,
        report: &mut JobReport,
    ) -> Result<ControlFlow<()>> {
        match command {
            Command::Write { pairs } => {
                if let Err(e) = self.engine.write(&pairs) {
                    diagnostic(job, WRITE_FAILED, &e);
                }
            }
            Command::Read { keys } => match self.engine.read(&keys) {
                Ok(results) => write_response(job.output(), &Response::read(results))?,
                Err(e) => diagnostic(job, READ_FAILED, &e),
            },
            Command::Delete { keys } => match self.engine.delete(&keys) {
                Ok(missing) => {
                    if let Some(response) = Response::missing(missing) {
                        write_response(job.output(), &response)?;
                    }
                }
                Err(e) => diagnostic(job, DELETE_FAILED, &e),
            },
            Command::Show => match self.engine.dump(job.output()) {
                Ok(()) => job.output().flush()?,
                Err(KvsError::Io(e)) => return Err(KvsError::Io(e)),
                Err(e) => diagnostic(job, "Failed to show table", &e),
            },
            Command::Wait { delay_ms } => {
                if delay_ms > 0 {
                    write_response(job.output(), &Response::Waiting)?;
                    thread::sleep(Duration::from_millis(delay_ms));
                }
            }
            Command::Backup => self.backup(job),
            Command::Help => write_response(job.output(), &Response::Help)?,
            Command::Empty => {}
            Command::Invalid { reason } => {
                report.invalid += 1;
                tracing::warn!(
                    job = %job.input_path().display(),
                    line = job.line_number(),
                    reason = %reason,
                    "{}",
                    INVALID_COMMAND
                );
            }
            Command::End => return Ok(ControlFlow::Break(())),
        }

        Ok(ControlFlow::Continue(()))
    }

    /// Number the backup, then hand it to the manager
    fn backup(&self, job: &mut Job) {
        let path = job.next_backup_path();
        if let Err(e) = self.backups.backup(self.engine, &path) {
            job.rollback_backup();
            diagnostic(job, BACKUP_FAILED, &e);
        }
    }
}

/// Report a failed command on the error channel
fn diagnostic(job: &Job, message: &str, error: &KvsError) {
    tracing::warn!(
        job = %job.input_path().display(),
        line = job.line_number(),
        error = %error,
        "{}",
        message
    );
}
