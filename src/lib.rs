//! # batchkv
//!
//! A concurrent, in-memory key-value store that drains a directory of batch
//! job files:
//! - Fixed-bucket hash table with one reader/writer lock per bucket
//! - Deadlock-free multi-key batches (sorted lock acquisition)
//! - Worker pool partitioning `.job` files across threads
//! - Background snapshots with a bound on outstanding snapshot workers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Job Directory                          │
//! │              a.job   b.job   c.job   ...                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ claim (mutex-guarded cursor)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Worker Pool                              │
//! │          (N threads, one job at a time each)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │   Engine    │◄─────────│ BackupManager │
//!   │ (bucket     │ snapshot │ (bounded      │
//!   │  RwLocks)   │          │  snapshots)   │
//!   └─────────────┘          └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod table;
pub mod engine;
pub mod protocol;
pub mod backup;
pub mod jobs;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvsError, Result};
pub use config::Config;
pub use engine::{Engine, Snapshot};
pub use backup::BackupManager;
pub use jobs::process_directory;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of batchkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
