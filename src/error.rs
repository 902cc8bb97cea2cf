//! Error types for batchkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvsError
pub type Result<T> = std::result::Result<T, KvsError>;

/// Unified error type for batchkv operations
#[derive(Debug, Error)]
pub enum KvsError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Engine Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("KVS state must be initialized")]
    Uninitialized,

    #[error("KVS state has already been initialized")]
    AlreadyInitialized,

    // -------------------------------------------------------------------------
    // Data Errors
    // -------------------------------------------------------------------------
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    // -------------------------------------------------------------------------
    // Backup Errors
    // -------------------------------------------------------------------------
    #[error("Failed to spawn snapshot worker: {0}")]
    BackupSpawn(std::io::Error),

    #[error("Snapshot failed: {0}")]
    Snapshot(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Bucket {0} accessed without holding its lock")]
    LockNotHeld(usize),

    #[error("Worker thread panicked")]
    WorkerPanicked,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
