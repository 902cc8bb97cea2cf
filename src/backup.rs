//! Backup Module
//!
//! Writes point-in-time snapshots of the table in the background while
//! bounding how many snapshot workers may be outstanding at once.
//!
//! ## Lifecycle of one BACKUP
//! ```text
//!   worker                              snapshot thread
//!   ──────                              ───────────────
//!   lock reaper
//!   while outstanding >= limit:
//!       recv exit notice  ◄──────────── (an older snapshot finishing)
//!       outstanding -= 1
//!   engine.snapshot()   (full read lock, point in time)
//!   spawn ────────────────────────────► create <job>-<n>.bck
//!   outstanding += 1                    write (key,value) lines
//!   unlock reaper, return               send exit notice
//! ```
//!
//! A finished snapshot stays "outstanding" until its exit notice is reaped,
//! so the count never exceeds the limit.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::engine::{Engine, Snapshot};
use crate::error::{KvsError, Result};

/// How a snapshot thread ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// File fully written and flushed
    Completed,

    /// I/O failure while writing the file
    Failed(String),

    /// The snapshot thread panicked
    Panicked,
}

/// Exit notice sent by every snapshot thread
#[derive(Debug, Clone)]
pub struct SnapshotExit {
    pub path: PathBuf,
    pub status: SnapshotStatus,
}

impl SnapshotExit {
    pub fn is_success(&self) -> bool {
        self.status == SnapshotStatus::Completed
    }

    fn log(&self) {
        match &self.status {
            SnapshotStatus::Completed => {
                tracing::debug!("Snapshot {} completed", self.path.display());
            }
            SnapshotStatus::Failed(reason) => {
                tracing::error!("Snapshot {} failed: {}", self.path.display(), reason);
            }
            SnapshotStatus::Panicked => {
                tracing::error!("Snapshot {} terminated abnormally", self.path.display());
            }
        }
    }
}

/// Bounds and tracks background snapshot threads
///
/// ## Concurrency:
/// - `reaper`: Mutex over the outstanding count and the exit receiver.
///   Held while waiting for a slot, so callers queue up behind it.
/// - Snapshot threads only touch the channel sender, never the mutex.
pub struct BackupManager {
    /// Max outstanding snapshots (at least 1)
    limit: usize,

    reaper: Mutex<Reaper>,

    /// Cloned into every snapshot thread
    exits: Sender<SnapshotExit>,

    /// Snapshots spawned so far (used for thread names)
    spawned: AtomicU64,

    /// High-water mark of `outstanding`
    peak: AtomicUsize,
}

struct Reaper {
    outstanding: usize,
    exits: Receiver<SnapshotExit>,
}

impl Reaper {
    /// Block until one snapshot thread exits, and account for it
    fn reap_one(&mut self) -> Result<SnapshotExit> {
        let exit = self
            .exits
            .recv()
            .map_err(|_| KvsError::Snapshot("exit channel closed".to_string()))?;
        self.outstanding -= 1;
        exit.log();
        Ok(exit)
    }
}

impl BackupManager {
    /// Create a manager allowing `limit` outstanding snapshots (0 means 1)
    pub fn new(limit: usize) -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            limit: limit.max(1),
            reaper: Mutex::new(Reaper {
                outstanding: 0,
                exits: rx,
            }),
            exits: tx,
            spawned: AtomicU64::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Start a snapshot of `engine` into `path`
    ///
    /// Blocks while the limit is reached, then copies the table and returns
    /// without waiting for the file to be written. Fails only if the table
    /// cannot be read or the snapshot thread cannot be spawned.
    pub fn backup(&self, engine: &Engine, path: &Path) -> Result<()> {
        let mut reaper = self.reaper.lock();
        while reaper.outstanding >= self.limit {
            tracing::debug!(
                "Backup limit {} reached, waiting for a snapshot to finish",
                self.limit
            );
            reaper.reap_one()?;
        }

        let snapshot = engine.snapshot()?;
        let id = self.spawned.fetch_add(1, Ordering::SeqCst) + 1;
        let notice = ExitNotice {
            path: path.to_path_buf(),
            exits: self.exits.clone(),
            sent: false,
        };

        thread::Builder::new()
            .name(format!("kvs-snapshot-{}", id))
            .spawn(move || {
                let mut notice = notice;
                let status = match write_snapshot(&snapshot, &notice.path) {
                    Ok(()) => SnapshotStatus::Completed,
                    Err(e) => SnapshotStatus::Failed(e.to_string()),
                };
                notice.send(status);
            })
            .map_err(KvsError::BackupSpawn)?;

        reaper.outstanding += 1;
        self.peak.fetch_max(reaper.outstanding, Ordering::SeqCst);
        tracing::debug!(
            "Snapshot {} started into {} ({} outstanding)",
            id,
            path.display(),
            reaper.outstanding
        );

        Ok(())
    }

    /// Reap every outstanding snapshot, returning their exit notices
    pub fn wait_all(&self) -> Result<Vec<SnapshotExit>> {
        let mut reaper = self.reaper.lock();
        let mut exits = Vec::with_capacity(reaper.outstanding);
        while reaper.outstanding > 0 {
            exits.push(reaper.reap_one()?);
        }
        Ok(exits)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Effective limit (never 0)
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Snapshots spawned and not yet reaped
    pub fn outstanding(&self) -> usize {
        self.reaper.lock().outstanding
    }

    /// Highest `outstanding` value observed
    pub fn peak_outstanding(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Total snapshots spawned
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::SeqCst)
    }
}

/// Sends the exit notice of a snapshot thread, also when it panics
struct ExitNotice {
    path: PathBuf,
    exits: Sender<SnapshotExit>,
    sent: bool,
}

impl ExitNotice {
    fn send(&mut self, status: SnapshotStatus) {
        self.sent = true;
        let exit = SnapshotExit {
            path: self.path.clone(),
            status,
        };
        // Receiver lives as long as the manager
        let _ = self.exits.send(exit);
    }
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        // Not sent and not panicking: the thread never started (spawn failed),
        // so it was never counted either
        if !self.sent && thread::panicking() {
            self.send(SnapshotStatus::Panicked);
        }
    }
}

/// Create `path` and write the snapshot in SHOW format
fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    snapshot.write_to(&mut writer)?;
    writer.flush()?;
    Ok(())
}
