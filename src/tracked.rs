//! Identity-tracked resource wrapper.
//!
//! Cached GPU views get recreated whenever their owning surface is rebuilt
//! (shadow size change, atlas reallocation). Consumers that key bind-group
//! caches off a view need a stable way to notice that, so every view handed
//! out by this crate is wrapped in [`Tracked`], which assigns a
//! process-unique id at creation time. Same id ⇒ same underlying GPU object.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Resource wrapper carrying a process-unique id.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    inner: T,
    id: u64,
}

impl<T> Tracked<T> {
    /// Wrap a resource and assign it a fresh id.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            id: next_id(),
        }
    }

    /// The unique id (usable as a bind-group cache key).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Unwrap the inner resource.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
