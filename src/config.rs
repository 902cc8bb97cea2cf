//! Configuration for batchkv
//!
//! Centralized configuration with sensible defaults, plus the fixed limits
//! shared by the parser and the engine.

use std::path::PathBuf;

use crate::error::{KvsError, Result};

// =============================================================================
// Limits
// =============================================================================

/// Default number of buckets in the hash table (one per letter)
pub const TABLE_SIZE: usize = 26;

/// Maximum length of a key or value, in bytes
pub const MAX_STRING_SIZE: usize = 40;

/// Maximum number of pairs (WRITE) or keys (READ/DELETE) per command
pub const MAX_WRITE_SIZE: usize = 256;

/// Longest job file line accepted, in bytes (a full WRITE batch fits)
pub const MAX_LINE_SIZE: usize = 32 * 1024;

/// Extension of the job files drained from the directory
pub const JOB_EXTENSION: &str = "job";

/// Extension of the per-job output files
pub const OUTPUT_EXTENSION: &str = "out";

/// Extension of the snapshot files written by BACKUP
pub const BACKUP_EXTENSION: &str = "bck";

/// Main configuration for a batchkv run
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Job Configuration
    // -------------------------------------------------------------------------
    /// Directory scanned for `.job` files. Outputs and snapshots are written
    /// next to their job:
    ///   {job_dir}/
    ///     ├── a.job
    ///     ├── a.out        (command results)
    ///     └── a-1.bck      (first BACKUP of a.job)
    pub job_dir: PathBuf,

    /// Number of worker threads draining the directory
    pub worker_threads: usize,

    // -------------------------------------------------------------------------
    // Backup Configuration
    // -------------------------------------------------------------------------
    /// Max outstanding snapshot workers (0 behaves like 1)
    pub backup_limit: usize,

    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// Number of buckets (and bucket locks)
    pub table_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            job_dir: PathBuf::from("./jobs"),
            worker_threads: 1,
            backup_limit: 1,
            table_size: TABLE_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject configurations the pool or the table cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(KvsError::Config(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.table_size == 0 {
            return Err(KvsError::Config(
                "table_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the directory holding the job files
    pub fn job_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.job_dir = path.into();
        self
    }

    /// Set the number of worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the maximum number of outstanding snapshot workers
    pub fn backup_limit(mut self, limit: usize) -> Self {
        self.config.backup_limit = limit;
        self
    }

    /// Set the number of hash table buckets
    pub fn table_size(mut self, size: usize) -> Self {
        self.config.table_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
