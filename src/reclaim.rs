//! Deferred GPU Object Destruction
//!
//! GPU objects must die on the render thread, at a frame point where no
//! outstanding commands reference them — but logical owners (components,
//! lights, probes) are frequently dropped from simulation or loader threads.
//! This module bridges the two with a multi-producer/single-consumer channel
//! of owned destruction closures: any thread enqueues, only the render
//! thread executes.
//!
//! ```text
//!   sim thread ──┐
//!   loader ──────┼── ReclaimQueue::enqueue ──► flume ──► process_pending()
//!   render ──────┘                                        (render thread,
//!                                                          frame boundary)
//! ```
//!
//! Moving handles into the closure at capture time means a request is either
//! fully owned by the queue or never existed — partially-acquired
//! sub-resources travel with it and cannot leak.

use std::panic::{AssertUnwindSafe, catch_unwind};

/// An owned destruction request.
///
/// The closure carries whatever GPU handles it must free; it runs exactly
/// once, on the render thread.
pub struct ReclaimRequest {
    label: &'static str,
    op: Box<dyn FnOnce() + Send + 'static>,
}

impl ReclaimRequest {
    /// Wrap a destruction closure. `label` shows up in logs when the
    /// closure misbehaves.
    pub fn new(label: &'static str, op: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label,
            op: Box::new(op),
        }
    }

    /// The diagnostic label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Cloneable producer handle, callable from any thread.
#[derive(Clone)]
pub struct ReclaimQueue {
    tx: flume::Sender<ReclaimRequest>,
}

impl ReclaimQueue {
    /// Append a destruction request.
    ///
    /// If the render-thread consumer is already gone (shutdown), the request
    /// runs inline rather than leaking — wgpu objects are safe to drop from
    /// any thread, deferral is an ordering optimization, not a correctness
    /// requirement there.
    pub fn enqueue(&self, request: ReclaimRequest) {
        if let Err(flume::SendError(request)) = self.tx.send(request) {
            log::warn!(
                "ReclaimQueue: consumer gone, destroying '{}' inline",
                request.label
            );
            run_guarded(request);
        }
    }

    /// Convenience: defer destruction of a texture.
    pub fn reclaim_texture(&self, label: &'static str, texture: wgpu::Texture) {
        self.enqueue(ReclaimRequest::new(label, move || texture.destroy()));
    }

    /// Convenience: defer destruction of a buffer.
    pub fn reclaim_buffer(&self, label: &'static str, buffer: wgpu::Buffer) {
        self.enqueue(ReclaimRequest::new(label, move || buffer.destroy()));
    }
}

/// Render-thread consumer of destruction requests.
pub struct DeferredReclaimer {
    tx: flume::Sender<ReclaimRequest>,
    rx: flume::Receiver<ReclaimRequest>,
}

impl DeferredReclaimer {
    /// Creates a reclaimer with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// A new producer handle for this reclaimer.
    #[must_use]
    pub fn queue(&self) -> ReclaimQueue {
        ReclaimQueue {
            tx: self.tx.clone(),
        }
    }

    /// Append a destruction request directly (render-thread shorthand for
    /// going through a [`ReclaimQueue`]).
    pub fn enqueue(&self, request: ReclaimRequest) {
        // Receiver lives in self, so this send cannot fail.
        let _ = self.tx.send(request);
    }

    /// Number of requests waiting to be processed.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.rx.len()
    }

    /// Execute every pending destruction request.
    ///
    /// Must run on the render thread, at a frame point with no outstanding
    /// GPU commands referencing the objects being freed. Panics inside a
    /// request are logged and swallowed: destructor-time unwinding on the
    /// render thread is not acceptable. Returns the number of requests
    /// processed.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        for request in self.rx.try_iter() {
            run_guarded(request);
            processed += 1;
        }
        if processed > 0 {
            log::debug!("DeferredReclaimer: processed {processed} request(s)");
        }
        processed
    }
}

impl Default for DeferredReclaimer {
    fn default() -> Self {
        Self::new()
    }
}

fn run_guarded(request: ReclaimRequest) {
    let label = request.label;
    if catch_unwind(AssertUnwindSafe(request.op)).is_err() {
        log::error!("DeferredReclaimer: destruction of '{label}' panicked, swallowed");
    }
}
