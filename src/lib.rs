#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! GPU render-resource cache and temporal invalidation.
//!
//! This crate is the resource-reuse layer of a real-time renderer: it keeps
//! expensive GPU-resident objects (visibility queries, per-light shadow
//! surfaces, GI probe-ray atlases) alive across frames, invalidates them
//! precisely when scene state drifts past configured thresholds, crossfades
//! between old and new versions of a resource, and defers GPU destruction to
//! a safe point on the render thread.
//!
//! # Threading
//!
//! A single dedicated render thread owns all GPU state. Every API here runs
//! on that thread, with one exception: [`ReclaimQueue::enqueue`] may be
//! called from any thread (e.g. a simulation thread freeing a logical
//! object).

pub mod atlas;
pub mod errors;
pub mod fader;
pub mod light;
pub mod pool;
pub mod query;
pub mod reclaim;
pub mod settings;
pub mod tracked;
pub mod tracker;

pub use atlas::{ProbeRayAtlas, RayChannel};
pub use errors::{CacheError, Result};
pub use fader::TemporalFader;
pub use light::shadow::{ShadowCacheEntry, ShadowSurface, ShadowSurfaceKind, ShadowTopology};
pub use light::{LightCacheFlags, LightHandle, LightRenderCache};
pub use pool::{PoolHandle, RecyclePool};
pub use query::{QueryId, QueryKind, QueryPool};
pub use reclaim::{DeferredReclaimer, ReclaimQueue, ReclaimRequest};
pub use settings::CacheSettings;
pub use tracked::Tracked;
pub use tracker::{AngleThreshold, ChangeTracker, DistanceThreshold};
