//! Ordered bucket lock sets
//!
//! A `LockedBuckets` holds the guards of one batch. Guards are acquired in
//! strictly ascending bucket order and released in reverse order on drop,
//! so two batches can never wait on each other in a cycle.

use std::ops::{Deref, DerefMut};

use crate::error::{KvsError, Result};

use super::Bucket;

/// Guards for a deduplicated, ascending set of bucket indices
pub struct LockedBuckets<G> {
    /// (bucket index, guard), sorted by index
    guards: Vec<(usize, G)>,
}

impl<G> LockedBuckets<G> {
    /// Acquire `lock(index)` for every index in `order`, front to back
    ///
    /// `order` must be strictly ascending (see `HashTable::lock_order`).
    pub(crate) fn acquire<F>(order: &[usize], mut lock: F) -> Self
    where
        F: FnMut(usize) -> G,
    {
        debug_assert!(
            order.windows(2).all(|pair| pair[0] < pair[1]),
            "bucket locks must be acquired in strictly ascending order"
        );

        let mut guards = Vec::with_capacity(order.len());
        for &index in order {
            guards.push((index, lock(index)));
        }

        tracing::trace!("Locked buckets {:?}", order);
        Self { guards }
    }

    /// Indices held, in acquisition order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.guards.iter().map(|(index, _)| *index)
    }

    /// Number of buckets held
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    fn position(&self, index: usize) -> Result<usize> {
        self.guards
            .binary_search_by_key(&index, |(held, _)| *held)
            .map_err(|_| KvsError::LockNotHeld(index))
    }
}

impl<G: Deref<Target = Bucket>> LockedBuckets<G> {
    /// Shared access to a held bucket
    pub fn bucket(&self, index: usize) -> Result<&Bucket> {
        let pos = self.position(index)?;
        Ok(self.guards[pos].1.deref())
    }

    /// Held buckets in ascending index order
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.guards.iter().map(|(_, guard)| guard.deref())
    }
}

impl<G: DerefMut<Target = Bucket>> LockedBuckets<G> {
    /// Exclusive access to a held bucket (write guards only)
    pub fn bucket_mut(&mut self, index: usize) -> Result<&mut Bucket> {
        let pos = self.position(index)?;
        Ok(self.guards[pos].1.deref_mut())
    }
}

impl<G> Drop for LockedBuckets<G> {
    fn drop(&mut self) {
        // Reverse of acquisition order
        while let Some((_, guard)) = self.guards.pop() {
            drop(guard);
        }
    }
}
