//! Job Source
//!
//! Hands out the `.job` files of a directory, each to exactly one worker.

use std::fs::{self, File, OpenOptions, ReadDir};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::config::{BACKUP_EXTENSION, JOB_EXTENSION, OUTPUT_EXTENSION};
use crate::error::Result;
use crate::protocol::{Command, CommandReader};

/// One claimed job: its command stream, its output and its backup counter
pub struct Job {
    commands: CommandReader<BufReader<File>>,
    output: BufWriter<File>,
    input_path: PathBuf,

    /// BACKUP commands issued so far (numbering of `.bck` files)
    backups: u32,
}

impl Job {
    /// Open `input_path` for reading and create/truncate its `.out` sibling
    ///
    /// If the output cannot be created the input is closed again.
    pub fn open(input_path: &Path) -> Result<Self> {
        let output_path = output_path_for(input_path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a .{} file", input_path.display(), JOB_EXTENSION),
            )
        })?;

        let input = File::open(input_path)?;
        let output = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&output_path)?;

        Ok(Self {
            commands: CommandReader::new(BufReader::new(input)),
            output: BufWriter::new(output),
            input_path: input_path.to_path_buf(),
            backups: 0,
        })
    }

    /// Next command from the input (`Command::End` when exhausted)
    pub fn next_command(&mut self) -> Result<Command> {
        self.commands.next_command()
    }

    /// Line number of the last command read
    pub fn line_number(&self) -> usize {
        self.commands.line_number()
    }

    /// Sink for everything the job prints
    pub fn output(&mut self) -> &mut BufWriter<File> {
        &mut self.output
    }

    /// Count one more BACKUP and return its snapshot path
    pub fn next_backup_path(&mut self) -> PathBuf {
        self.backups += 1;
        backup_path_for(&self.input_path, self.backups)
    }

    /// Undo the last `next_backup_path` (the backup never started)
    pub fn rollback_backup(&mut self) {
        self.backups = self.backups.saturating_sub(1);
    }

    pub fn backup_count(&self) -> u32 {
        self.backups
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Flush the output and close both files
    pub fn close(mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

/// Outcome of inspecting one directory entry
enum Candidate {
    Found(Job),
    Skipped,
    Exhausted,
}

/// Shared cursor over a job directory
///
/// ## Concurrency:
/// - `entries`: one mutex around the directory iterator, so each entry is
///   looked at (and each job claimed) by exactly one worker
/// - `None` once the iterator has run dry
pub struct JobSource {
    dir: PathBuf,
    entries: Mutex<Option<ReadDir>>,
    claimed: AtomicUsize,
}

impl JobSource {
    /// Open `dir` for scanning
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir)?;
        tracing::debug!("Scanning {} for jobs", dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            entries: Mutex::new(Some(entries)),
            claimed: AtomicUsize::new(0),
        })
    }

    /// Claim the next job, or `None` when the directory is drained
    pub fn claim_next(&self) -> Option<Job> {
        let mut entries = self.entries.lock();
        loop {
            let candidate = match entries.as_mut() {
                Some(iter) => next_candidate(iter),
                None => Candidate::Exhausted,
            };

            match candidate {
                Candidate::Found(job) => {
                    self.claimed.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!("Claimed job {}", job.input_path().display());
                    return Some(job);
                }
                Candidate::Skipped => continue,
                Candidate::Exhausted => {
                    *entries = None;
                    return None;
                }
            }
        }
    }

    /// Directory being drained
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Jobs handed out so far
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::SeqCst)
    }
}

/// Advance the iterator by one entry
fn next_candidate(entries: &mut ReadDir) -> Candidate {
    let entry = match entries.next() {
        None => return Candidate::Exhausted,
        Some(Err(e)) => {
            tracing::warn!("Failed to read directory entry: {}", e);
            return Candidate::Skipped;
        }
        Some(Ok(entry)) => entry,
    };

    let path = entry.path();
    if job_stem(&path).is_none() {
        return Candidate::Skipped;
    }
    if !path.is_file() {
        tracing::debug!("Skipping {}: not a regular file", path.display());
        return Candidate::Skipped;
    }

    match Job::open(&path) {
        Ok(job) => Candidate::Found(job),
        Err(e) => {
            tracing::warn!("Skipping job {}: {}", path.display(), e);
            Candidate::Skipped
        }
    }
}

// =============================================================================
// Path Helpers
// =============================================================================

/// File name without the `.job` suffix, if it has one
///
/// "a.job" → Some("a"), "a.JOB" / "a.job.out" → None
pub fn job_stem(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_suffix(JOB_EXTENSION)?
        .strip_suffix('.')
}

/// "dir/a.job" → "dir/a.out"
pub fn output_path_for(input_path: &Path) -> Option<PathBuf> {
    let stem = job_stem(input_path)?;
    Some(input_path.with_file_name(format!("{}.{}", stem, OUTPUT_EXTENSION)))
}

/// "dir/a.job", 2 → "dir/a-2.bck"
///
/// Falls back to the full file name when the path has no `.job` suffix.
pub fn backup_path_for(input_path: &Path, counter: u32) -> PathBuf {
    let stem = job_stem(input_path)
        .map(str::to_string)
        .or_else(|| input_path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();
    input_path.with_file_name(format!("{}-{}.{}", stem, counter, BACKUP_EXTENSION))
}
