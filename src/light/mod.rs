//! Per-Light Render Cache
//!
//! One [`LightRenderCache`] remembers everything the light-preparation pass
//! derived for a single visible light — how it wants its shadows rendered
//! and the shadow surfaces themselves (one sub-cache for solid geometry, one
//! for transparent) — so the next frame can reuse instead of recompute.
//!
//! The cache is tied to exactly one light handle at a time: pointing it at a
//! different light resets every flag, the memory counter, and both shadow
//! sub-caches to their unused state, forcing a full recompute.

pub mod shadow;

use bitflags::bitflags;

use crate::errors::{CacheError, Result};
use crate::reclaim::{ReclaimQueue, ReclaimRequest};
use shadow::ShadowCacheEntry;

/// Opaque identity of a scene light.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LightHandle(pub u64);

bitflags! {
    /// Render configuration recorded by the light-preparation pass.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct LightCacheFlags: u8 {
        /// Preparation ran since the last reset.
        const PREPARED      = 1 << 0;
        /// Shadows render into cube maps (point/omni light).
        const CUBE_MAPS     = 1 << 1;
        /// Depth is encoded into color channels.
        const ENCODED_DEPTH = 1 << 2;
        /// Transparent geometry casts shadows for this light.
        const TRANSPARENCY  = 1 << 3;
    }
}

/// Cached render configuration and shadow surfaces for one light.
///
/// Render-thread only; driven by the scene/light manager once per visible
/// light per frame.
pub struct LightRenderCache {
    light: Option<LightHandle>,
    flags: LightCacheFlags,
    memory_consumption: u64,
    solid: ShadowCacheEntry,
    transparent: ShadowCacheEntry,
}

impl LightRenderCache {
    /// Creates a cache bound to no light.
    #[must_use]
    pub fn new() -> Self {
        Self {
            light: None,
            flags: LightCacheFlags::empty(),
            memory_consumption: 0,
            solid: ShadowCacheEntry::new(),
            transparent: ShadowCacheEntry::new(),
        }
    }

    /// Bind the cache to a light.
    ///
    /// No-op when the handle is unchanged. A different handle resets all
    /// flags, zeroes the memory counter, and sets both shadow sizes to 0,
    /// forcing a full recompute for the new light.
    pub fn set_light(&mut self, light: LightHandle) {
        if self.light == Some(light) {
            return;
        }
        self.light = Some(light);
        self.flags = LightCacheFlags::empty();
        self.memory_consumption = 0;
        self.solid.set_size(0);
        self.transparent.set_size(0);
    }

    /// The light this cache is bound to.
    #[must_use]
    pub fn light(&self) -> Option<LightHandle> {
        self.light
    }

    // ── Flag recorders ─────────────────────────────────────────────────────

    pub fn set_prepared(&mut self, prepared: bool) {
        self.flags.set(LightCacheFlags::PREPARED, prepared);
    }

    #[must_use]
    pub fn prepared(&self) -> bool {
        self.flags.contains(LightCacheFlags::PREPARED)
    }

    pub fn set_use_cube_maps(&mut self, use_cube_maps: bool) {
        self.flags.set(LightCacheFlags::CUBE_MAPS, use_cube_maps);
    }

    #[must_use]
    pub fn use_cube_maps(&self) -> bool {
        self.flags.contains(LightCacheFlags::CUBE_MAPS)
    }

    pub fn set_use_encoded_depth(&mut self, use_encoded_depth: bool) {
        self.flags
            .set(LightCacheFlags::ENCODED_DEPTH, use_encoded_depth);
    }

    #[must_use]
    pub fn use_encoded_depth(&self) -> bool {
        self.flags.contains(LightCacheFlags::ENCODED_DEPTH)
    }

    pub fn set_use_transparency(&mut self, use_transparency: bool) {
        self.flags
            .set(LightCacheFlags::TRANSPARENCY, use_transparency);
    }

    #[must_use]
    pub fn use_transparency(&self) -> bool {
        self.flags.contains(LightCacheFlags::TRANSPARENCY)
    }

    /// The full flag set.
    #[must_use]
    pub fn flags(&self) -> LightCacheFlags {
        self.flags
    }

    // ── Memory accounting ──────────────────────────────────────────────────

    /// Record the memory footprint attributed to this light.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidArgument`] for negative values; the counter is
    /// left untouched.
    pub fn set_memory_consumption(&mut self, bytes: i64) -> Result<()> {
        if bytes < 0 {
            return Err(CacheError::InvalidArgument {
                context: "memory consumption must not be negative",
                value: bytes as f64,
            });
        }
        self.memory_consumption = bytes.unsigned_abs();
        Ok(())
    }

    /// Recorded memory footprint plus the live footprint of both shadow
    /// sub-caches, in bytes.
    #[must_use]
    pub fn memory_consumption(&self) -> u64 {
        self.memory_consumption
            + self.solid.memory_consumption()
            + self.transparent.memory_consumption()
    }

    // ── Shadow sub-caches ──────────────────────────────────────────────────

    /// Shadow cache for solid geometry.
    #[must_use]
    pub fn solid(&self) -> &ShadowCacheEntry {
        &self.solid
    }

    pub fn solid_mut(&mut self) -> &mut ShadowCacheEntry {
        &mut self.solid
    }

    /// Shadow cache for transparent geometry.
    #[must_use]
    pub fn transparent(&self) -> &ShadowCacheEntry {
        &self.transparent
    }

    pub fn transparent_mut(&mut self) -> &mut ShadowCacheEntry {
        &mut self.transparent
    }

    // ── Teardown ───────────────────────────────────────────────────────────

    /// Release all GPU surfaces through the deferred reclaimer and unbind
    /// the light.
    ///
    /// Safe to drive from any owner: the surfaces travel inside one owned
    /// reclaim request and die on the render thread at the next safe point.
    pub fn reclaim(&mut self, queue: &ReclaimQueue) {
        let mut textures = self.solid.take_surfaces();
        textures.extend(self.transparent.take_surfaces());
        self.light = None;
        self.flags = LightCacheFlags::empty();
        self.memory_consumption = 0;
        if textures.is_empty() {
            return;
        }
        queue.enqueue(ReclaimRequest::new("light shadow surfaces", move || {
            for texture in textures {
                texture.destroy();
            }
        }));
    }
}

impl Default for LightRenderCache {
    fn default() -> Self {
        Self::new()
    }
}
