//! Generic Recycle Pool
//!
//! Claim/release pool for reusable GPU objects. The same
//! claim-from-free-list-else-allocate pattern recurs for every transient GPU
//! handle kind (visibility queries today, fences or staging buffers
//! tomorrow), so it lives here once, parameterized over the resource type.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              RecyclePool<T>                   │
//! │                                              │
//! │  claimed: SlotMap<PoolHandle, T>             │
//! │  free:    SmallVec<T>                        │
//! │                                              │
//! │  claim_with(factory) → PoolHandle            │
//! │  release(handle)     → Result<()>            │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The pool never shrinks during normal operation: released resources stay
//! in the free list for reuse, so the live count never exceeds the historical
//! peak of simultaneous claims.

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::errors::{CacheError, Result};

new_key_type! {
    /// Generational handle to a claimed pool resource.
    ///
    /// Stale handles (already released) are rejected structurally by the
    /// slot map's generation counter.
    pub struct PoolHandle;
}

/// Claim/release pool of reusable resources.
///
/// Render-thread only, like every owner of GPU state in this crate.
pub struct RecyclePool<T> {
    claimed: SlotMap<PoolHandle, T>,
    free: SmallVec<[T; 8]>,
    /// Total resources ever created, for growth diagnostics.
    created: usize,
}

impl<T> RecyclePool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            claimed: SlotMap::with_key(),
            free: SmallVec::new(),
            created: 0,
        }
    }

    /// Claim a resource, reusing a free one if available, otherwise
    /// allocating a new one via `factory`.
    ///
    /// Never fails; the pool only grows.
    pub fn claim_with(&mut self, factory: impl FnOnce() -> T) -> PoolHandle {
        let resource = if let Some(r) = self.free.pop() {
            r
        } else {
            self.created += 1;
            factory()
        };
        self.claimed.insert(resource)
    }

    /// Return a claimed resource to the free list.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidReference`] if `handle` is not currently claimed
    /// (double release, or a handle from another pool).
    pub fn release(&mut self, handle: PoolHandle) -> Result<()> {
        let resource = self
            .claimed
            .remove(handle)
            .ok_or(CacheError::InvalidReference("pool handle not claimed"))?;
        self.free.push(resource);
        Ok(())
    }

    /// Access a claimed resource.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.claimed.get(handle)
    }

    /// Mutably access a claimed resource.
    #[must_use]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.claimed.get_mut(handle)
    }

    /// Number of currently claimed resources.
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }

    /// Number of resources sitting in the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total resources managed by the pool (claimed and free).
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.claimed.len() + self.free.len()
    }

    /// Total resources ever created by this pool.
    ///
    /// Equals [`total_count`](Self::total_count) exactly when every claim
    /// that missed the free list allocated; useful to assert reuse in tests.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Iterate over all claimed resources.
    pub fn iter_claimed(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.claimed.iter()
    }
}

impl<T> Default for RecyclePool<T> {
    fn default() -> Self {
        Self::new()
    }
}
