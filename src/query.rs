//! Visibility Query Pool
//!
//! Claim/release pool of reusable GPU visibility (occlusion) queries with a
//! single global "active query" slot. The hard invariant lives here: at most
//! one query may be active process-wide, because nested GPU occlusion scopes
//! are not portable. `begin` enforces it by auto-ending whichever query is
//! currently active.
//!
//! # Result flow
//!
//! Queries are recorded into a lazily grown [`wgpu::QuerySet`]; results
//! travel query set → resolve buffer → staging buffer → CPU:
//!
//! 1. Attach [`QueryPool::ensure_query_set`] to the render pass descriptor
//!    and record `begin_occlusion_query(index)` with the index returned by
//!    [`QueryPool::begin`].
//! 2. After the passes, encode [`QueryPool::resolve`].
//! 3. After `queue.submit`, call [`QueryPool::schedule_readback`].
//! 4. Poll with [`QueryPool::poll_results`] / [`QueryPool::has_result`], or
//!    force the value with [`QueryPool::result`], which may block the render
//!    thread on the GPU pipeline — a bounded stall, accepted by callers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{CacheError, Result};
use crate::pool::{PoolHandle, RecyclePool};

/// What a visibility query measures.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QueryKind {
    /// Did any sample pass the depth test?
    AnyHit,
    /// How many samples passed? Requires precise-count support.
    SampleCount,
}

/// Handle to a claimed query.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct QueryId(PoolHandle);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SlotState {
    Idle,
    Active(QueryKind),
    Ended(QueryKind),
}

struct QuerySlot {
    /// Fixed index into the query set; assigned once at allocation.
    index: u32,
    state: SlotState,
    result: Option<u64>,
}

struct GpuQueries {
    query_set: wgpu::QuerySet,
    capacity: u32,
    resolve_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    staging_ready: Arc<AtomicBool>,
    staging_pending: bool,
}

/// Pool of reusable GPU visibility queries.
///
/// Render-thread only.
pub struct QueryPool {
    slots: RecyclePool<QuerySlot>,
    active: Option<QueryId>,
    supports_sample_count: bool,
    gpu: Option<GpuQueries>,
}

/// Query sets are grown in steps of this many queries.
const CAPACITY_STEP: u32 = 64;

impl QueryPool {
    /// Creates an empty pool.
    ///
    /// `supports_sample_count` states whether the platform can run precise
    /// sample-count queries; derive it with [`QueryPool::from_features`]
    /// when a device is at hand.
    #[must_use]
    pub fn new(supports_sample_count: bool) -> Self {
        Self {
            slots: RecyclePool::new(),
            active: None,
            supports_sample_count,
            gpu: None,
        }
    }

    /// Creates a pool with capabilities derived from the device features.
    #[must_use]
    pub fn from_features(features: wgpu::Features) -> Self {
        Self::new(features.contains(wgpu::Features::PIPELINE_STATISTICS_QUERY))
    }

    // ── Claim / release ────────────────────────────────────────────────────

    /// Claim a query from the free list, allocating a new slot if none is
    /// free. Never fails; the pool only grows.
    pub fn claim(&mut self) -> QueryId {
        let index = self.slots.created_count() as u32;
        let id = QueryId(self.slots.claim_with(|| QuerySlot {
            index,
            state: SlotState::Idle,
            result: None,
        }));
        // Reused slots keep their query-set index but must not keep a stale
        // result or state.
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.state = SlotState::Idle;
            slot.result = None;
        }
        id
    }

    /// Return a query to the free list.
    ///
    /// Releasing the active query deactivates it first.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidReference`] if `id` is not currently claimed.
    pub fn release(&mut self, id: QueryId) -> Result<()> {
        if self.active == Some(id) {
            self.active = None;
        }
        self.slots.release(id.0)
    }

    // ── Active-query state machine ─────────────────────────────────────────

    /// Start measuring with this query.
    ///
    /// Whichever query is currently active is ended first, so at most one
    /// query is ever active. Returns the query-set index to record with
    /// `RenderPass::begin_occlusion_query`.
    ///
    /// # Errors
    ///
    /// - [`CacheError::UnsupportedOperation`] for
    ///   [`QueryKind::SampleCount`] without platform support. Surfaced, not
    ///   downgraded: an any-hit answer where a count was expected would
    ///   corrupt visibility decisions.
    /// - [`CacheError::InvalidReference`] if `id` is not claimed.
    pub fn begin(&mut self, id: QueryId, kind: QueryKind) -> Result<u32> {
        if kind == QueryKind::SampleCount && !self.supports_sample_count {
            return Err(CacheError::UnsupportedOperation(
                "sample-count visibility queries not supported on this platform",
            ));
        }
        if self.slots.get(id.0).is_none() {
            return Err(CacheError::InvalidReference("query not claimed"));
        }
        if let Some(current) = self.active {
            self.end(current);
        }
        let slot = self
            .slots
            .get_mut(id.0)
            .ok_or(CacheError::InvalidReference("query not claimed"))?;
        slot.state = SlotState::Active(kind);
        slot.result = None;
        self.active = Some(id);
        Ok(slot.index)
    }

    /// Stop measuring with this query.
    ///
    /// No-op unless `id` is the active query, so stale end calls after an
    /// auto-end are harmless.
    pub fn end(&mut self, id: QueryId) {
        if self.active != Some(id) {
            return;
        }
        if let Some(slot) = self.slots.get_mut(id.0)
            && let SlotState::Active(kind) = slot.state
        {
            slot.state = SlotState::Ended(kind);
        }
        self.active = None;
    }

    /// Whether this query is the active one.
    #[must_use]
    pub fn is_active(&self, id: QueryId) -> bool {
        self.active == Some(id)
    }

    /// The query-set index of a claimed query.
    #[must_use]
    pub fn query_index(&self, id: QueryId) -> Option<u32> {
        self.slots.get(id.0).map(|s| s.index)
    }

    /// Number of queries currently claimed.
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.slots.claimed_count()
    }

    /// Total queries managed (claimed and free).
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.slots.total_count()
    }

    // ── GPU plumbing ───────────────────────────────────────────────────────

    /// The query set backing this pool, grown to cover every allocated
    /// slot. Attach it to the render pass descriptor as
    /// `occlusion_query_set`.
    ///
    /// Growing recreates the set, which discards unfetched GPU results;
    /// queries are re-issued every frame so nothing of value is lost.
    pub fn ensure_query_set(&mut self, device: &wgpu::Device) -> &wgpu::QuerySet {
        let needed = (self.slots.created_count() as u32).max(1);
        if self.gpu.as_ref().is_none_or(|gpu| gpu.capacity < needed) {
            let capacity = needed.div_ceil(CAPACITY_STEP) * CAPACITY_STEP;
            self.gpu = Some(GpuQueries::new(device, capacity));
        }
        let gpu = self.gpu.as_ref().expect("query set allocated above");
        &gpu.query_set
    }

    /// Encode resolving all query results into the staging buffer.
    ///
    /// Call once per frame after the passes that recorded queries.
    pub fn resolve(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let count = self.slots.created_count() as u32;
        let Some(gpu) = &mut self.gpu else { return };
        // Claims made after the set was last ensured have no backing slot
        // yet; they resolve next frame.
        let count = count.min(gpu.capacity);
        if count == 0 || gpu.staging_pending {
            return;
        }
        encoder.resolve_query_set(&gpu.query_set, 0..count, &gpu.resolve_buffer, 0);
        encoder.copy_buffer_to_buffer(
            &gpu.resolve_buffer,
            0,
            &gpu.staging_buffer,
            0,
            u64::from(count) * 8,
        );
    }

    /// Request the asynchronous map of the staging buffer.
    ///
    /// Must be called after the commands encoded by
    /// [`resolve`](Self::resolve) were submitted.
    pub fn schedule_readback(&mut self) {
        let Some(gpu) = &mut self.gpu else { return };
        if gpu.staging_pending {
            return;
        }
        let ready = gpu.staging_ready.clone();
        ready.store(false, Ordering::SeqCst);
        gpu.staging_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |res| {
                if let Err(e) = res {
                    log::error!("QueryPool: staging map_async failed: {e:?}");
                }
                ready.store(true, Ordering::SeqCst);
            });
        gpu.staging_pending = true;
    }

    /// Non-blocking poll: nudges the device and harvests results if the
    /// staging buffer finished mapping.
    pub fn poll_results(&mut self, device: &wgpu::Device) {
        if self.gpu.is_some() {
            let _ = device.poll(wgpu::PollType::Poll);
            self.harvest_if_ready();
        }
    }

    /// Whether the result for this query has arrived on the CPU.
    #[must_use]
    pub fn has_result(&self, id: QueryId) -> bool {
        self.slots
            .get(id.0)
            .is_some_and(|slot| slot.result.is_some())
    }

    /// The query's result, blocking on the GPU pipeline if it has not
    /// arrived yet.
    ///
    /// For [`QueryKind::AnyHit`] any non-zero value means visible.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidReference`] if `id` is not claimed, or was
    ///   never ended and resolved.
    /// - [`CacheError::ResourceExhaustion`] if the device was lost while
    ///   waiting.
    pub fn result(&mut self, device: &wgpu::Device, id: QueryId) -> Result<u64> {
        if !self.has_result(id) && self.gpu.as_ref().is_some_and(|g| g.staging_pending) {
            device
                .poll(wgpu::PollType::Wait {
                    submission_index: None,
                    timeout: None,
                })
                .map_err(|e| CacheError::ResourceExhaustion(format!("device poll failed: {e}")))?;
            self.harvest_if_ready();
        }
        self.slots
            .get(id.0)
            .ok_or(CacheError::InvalidReference("query not claimed"))?
            .result
            .ok_or(CacheError::InvalidReference(
                "query has no resolved result",
            ))
    }

    fn harvest_if_ready(&mut self) {
        let Some(gpu) = &mut self.gpu else { return };
        if !gpu.staging_pending || !gpu.staging_ready.load(Ordering::SeqCst) {
            return;
        }
        let data = gpu.staging_buffer.slice(..).get_mapped_range();
        // One u64 per query-set slot, little-endian.
        let values: Vec<u64> = data
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().expect("8-byte chunk")))
            .collect();
        drop(data);
        gpu.staging_buffer.unmap();
        gpu.staging_pending = false;

        let ended: Vec<PoolHandle> = self
            .slots
            .iter_claimed()
            .filter(|(_, slot)| matches!(slot.state, SlotState::Ended(_)))
            .map(|(h, _)| h)
            .collect();
        for handle in ended {
            if let Some(slot) = self.slots.get_mut(handle)
                && let Some(value) = values.get(slot.index as usize)
            {
                slot.result = Some(*value);
                slot.state = SlotState::Idle;
            }
        }
    }
}

impl GpuQueries {
    fn new(device: &wgpu::Device, capacity: u32) -> Self {
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("glint visibility queries"),
            ty: wgpu::QueryType::Occlusion,
            count: capacity,
        });
        let size = u64::from(capacity) * 8;
        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint query resolve"),
            size,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint query staging"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            query_set,
            capacity,
            resolve_buffer,
            staging_buffer,
            staging_ready: Arc::new(AtomicBool::new(false)),
            staging_pending: false,
        }
    }
}
