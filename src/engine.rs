//! Engine Module
//!
//! The key-value engine that every worker shares.
//!
//! ## Responsibilities
//! - Own the hash table and its lock array for the process lifetime
//! - Run batched write/read/delete calls under ordered bucket locks
//! - Render the table for SHOW and for snapshots
//! - Enforce the init → use → terminate lifecycle

use std::io::Write;

use parking_lot::RwLock;

use crate::config::{MAX_STRING_SIZE, TABLE_SIZE};
use crate::error::{KvsError, Result};
use crate::table::{Entry, HashTable};

/// The shared key-value engine
///
/// ## Concurrency Model: per-bucket reader/writer locks
///
/// - **Writes/Deletes**: write-lock the sorted, deduplicated set of buckets
///   the batch touches, apply the batch, release in reverse order
/// - **Reads**: same protocol with read locks, so a batch never observes a
///   half-applied write batch on the buckets it reads
/// - **Dump/Snapshot**: read-lock every bucket in ascending order and copy;
///   dump writes the copy only after the locks are released
///
/// The outer `RwLock<Option<..>>` only guards the lifecycle. Operations hold
/// it in read mode; `init` and `terminate` take it in write mode.
pub struct Engine {
    /// Bucket count used on `init`
    table_size: usize,

    /// `None` before `init` and after `terminate`
    table: RwLock<Option<HashTable>>,
}

impl Engine {
    /// Create an engine that still needs `init`
    pub fn new(table_size: usize) -> Self {
        Self {
            table_size: table_size.max(1),
            table: RwLock::new(None),
        }
    }

    /// Create and initialize an engine
    pub fn open(table_size: usize) -> Result<Self> {
        let engine = Self::new(table_size);
        engine.init()?;
        Ok(engine)
    }

    /// Allocate the table and its locks
    pub fn init(&self) -> Result<()> {
        let mut state = self.table.write();
        if state.is_some() {
            return Err(KvsError::AlreadyInitialized);
        }
        *state = Some(HashTable::new(self.table_size));
        tracing::debug!("Engine initialized with {} buckets", self.table_size);
        Ok(())
    }

    /// Release the table; later calls fail with `Uninitialized`
    pub fn terminate(&self) -> Result<()> {
        let mut state = self.table.write();
        if state.take().is_none() {
            return Err(KvsError::Uninitialized);
        }
        tracing::debug!("Engine terminated");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.table.read().is_some()
    }

    /// Upsert every pair, in call order (last write wins)
    ///
    /// Invalid pairs are logged and skipped; the rest of the batch is still
    /// applied. Returns the number of pairs applied.
    pub fn write<K, V>(&self, pairs: &[(K, V)]) -> Result<usize>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let state = self.table.read();
        let table = state.as_ref().ok_or(KvsError::Uninitialized)?;

        let valid: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(key, value)| (key.as_ref(), value.as_ref()))
            .filter(|(key, value)| match validate_entry(key, value) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to write keypair ({},{}): {}", key, value, e);
                    false
                }
            })
            .collect();

        let mut locked = table.write_keys(valid.iter().map(|(key, _)| *key));
        for (key, value) in &valid {
            locked.bucket_mut(table.index_of(key))?.upsert(key, value);
        }

        Ok(valid.len())
    }

    /// Look up every key, in call order
    ///
    /// Each result is `(key, Some(value))` or `(key, None)` when missing.
    pub fn read<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<(String, Option<String>)>> {
        let state = self.table.read();
        let table = state.as_ref().ok_or(KvsError::Uninitialized)?;

        let locked = table.read_keys(keys.iter().map(|key| key.as_ref()));
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            let value = locked.bucket(table.index_of(key))?.get(key).map(str::to_string);
            results.push((key.to_string(), value));
        }

        Ok(results)
    }

    /// Remove every key, in call order
    ///
    /// Returns the keys that were not present.
    pub fn delete<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<String>> {
        let state = self.table.read();
        let table = state.as_ref().ok_or(KvsError::Uninitialized)?;

        let mut locked = table.write_keys(keys.iter().map(|key| key.as_ref()));
        let mut missing = Vec::new();
        for key in keys {
            let key = key.as_ref();
            if !locked.bucket_mut(table.index_of(key))?.remove(key) {
                missing.push(key.to_string());
            }
        }

        Ok(missing)
    }

    /// Write every entry as a `(key,value)` line, bucket by bucket
    ///
    /// The table is copied under the read locks and written to `sink` after
    /// they are released, so a slow sink never stalls writers.
    pub fn dump<W: Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
        let snapshot = self.snapshot()?;
        snapshot.write_to(sink)?;
        Ok(())
    }

    /// Point-in-time copy of the whole table, in dump order
    pub fn snapshot(&self) -> Result<Snapshot> {
        let state = self.table.read();
        let table = state.as_ref().ok_or(KvsError::Uninitialized)?;

        let locked = table.read_all();
        let entries = locked
            .buckets()
            .flat_map(|bucket| bucket.iter().cloned())
            .collect();

        Ok(Snapshot { entries })
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of live entries
    pub fn len(&self) -> Result<usize> {
        let state = self.table.read();
        let table = state.as_ref().ok_or(KvsError::Uninitialized)?;

        let locked = table.read_all();
        let count = locked.buckets().map(|bucket| bucket.len()).sum();
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of buckets
    pub fn table_size(&self) -> usize {
        self.table_size
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(TABLE_SIZE)
    }
}

/// Reject pairs the table cannot store
fn validate_entry(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(KvsError::InvalidEntry("empty key".to_string()));
    }
    if key.len() > MAX_STRING_SIZE {
        return Err(KvsError::InvalidEntry(format!(
            "key longer than {} bytes",
            MAX_STRING_SIZE
        )));
    }
    if value.len() > MAX_STRING_SIZE {
        return Err(KvsError::InvalidEntry(format!(
            "value longer than {} bytes",
            MAX_STRING_SIZE
        )));
    }
    Ok(())
}

/// Immutable copy of the table taken under a full read lock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<Entry>,
}

impl Snapshot {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render in the SHOW format, one `(key,value)` line per entry
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> std::io::Result<()> {
        for entry in &self.entries {
            writeln!(sink, "{}", entry)?;
        }
        Ok(())
    }
}
