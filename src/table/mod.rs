//! Hash Table Module
//!
//! Fixed-size bucket array with one reader/writer lock per bucket.
//!
//! ## Responsibilities
//! - Map keys to buckets (`hash(key) mod size`)
//! - Own the lock array: each bucket lives inside its own `RwLock`, so a
//!   bucket cannot be touched without holding its lock
//! - Hand out ordered lock sets for multi-key batches
//!
//! ## Layout
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬─────┐
//! │ RwLock<B 0>  │ RwLock<B 1>  │ RwLock<B 2>  │ ... │
//! │ [(a,1)(ab,2)]│ [(b,7)]      │ []           │     │
//! └──────────────┴──────────────┴──────────────┴─────┘
//! ```
//!
//! ## Lock Ordering
//! Every batch computes the bucket indices of its keys, deduplicates and
//! sorts them, and acquires the locks in ascending order. Whole-table
//! traversals (dump, snapshot) lock every bucket in the same order.

mod bucket;
mod locks;

pub use bucket::{Bucket, Entry};
pub use locks::LockedBuckets;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Write guards over a batch of buckets
pub type WriteLocked<'a> = LockedBuckets<RwLockWriteGuard<'a, Bucket>>;

/// Read guards over a batch of buckets
pub type ReadLocked<'a> = LockedBuckets<RwLockReadGuard<'a, Bucket>>;

/// Bucket slot for `key` in a table of `table_size` buckets
///
/// Keyed on the first character: letters map to 0..=25 regardless of case,
/// digits to 0..=9, anything else to its byte value.
pub fn bucket_index(key: &str, table_size: usize) -> usize {
    let slot = match key.as_bytes().first() {
        Some(&b) if b.is_ascii_alphabetic() => usize::from(b.to_ascii_lowercase() - b'a'),
        Some(&b) if b.is_ascii_digit() => usize::from(b - b'0'),
        Some(&b) => usize::from(b),
        None => 0,
    };
    slot % table_size.max(1)
}

/// The bucket array and its lock array
pub struct HashTable {
    buckets: Box<[RwLock<Bucket>]>,
}

impl HashTable {
    /// Allocate `size` empty buckets (at least one)
    pub fn new(size: usize) -> Self {
        let buckets = (0..size.max(1))
            .map(|_| RwLock::new(Bucket::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { buckets }
    }

    /// Number of buckets
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket index of `key`
    pub fn index_of(&self, key: &str) -> usize {
        bucket_index(key, self.size())
    }

    /// Sorted, deduplicated bucket indices touched by `keys`
    pub fn lock_order<'k, I>(&self, keys: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'k str>,
    {
        let mut order: Vec<usize> = keys.into_iter().map(|key| self.index_of(key)).collect();
        order.sort_unstable();
        order.dedup();
        order
    }

    /// Write-lock every bucket touched by `keys`, in ascending order
    pub fn write_keys<'k, I>(&self, keys: I) -> WriteLocked<'_>
    where
        I: IntoIterator<Item = &'k str>,
    {
        let order = self.lock_order(keys);
        LockedBuckets::acquire(&order, |index| self.buckets[index].write())
    }

    /// Read-lock every bucket touched by `keys`, in ascending order
    pub fn read_keys<'k, I>(&self, keys: I) -> ReadLocked<'_>
    where
        I: IntoIterator<Item = &'k str>,
    {
        let order = self.lock_order(keys);
        LockedBuckets::acquire(&order, |index| self.buckets[index].read())
    }

    /// Read-lock the whole table, in ascending order
    pub fn read_all(&self) -> ReadLocked<'_> {
        let order: Vec<usize> = (0..self.size()).collect();
        LockedBuckets::acquire(&order, |index| self.buckets[index].read())
    }
}
