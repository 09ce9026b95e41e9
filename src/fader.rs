//! Temporal Crossfader
//!
//! Three-slot crossfade pipeline between versions of a cached resource
//! (typically environment cube maps). When the scene switches from resource
//! A to resource B, the renderer keeps drawing A while blending B in over
//! time rather than popping instantly; if a third request arrives mid-fade
//! it waits in a single queued slot.
//!
//! ```text
//!   active ◄── fading ◄── queued
//!     A          B           C      blend: 1.0 → 0.0 (promote, +1.0)
//! ```
//!
//! Slots hold `Arc<T>` so occupancy and ownership are the same thing: a
//! slot assignment is the reference increment, a slot clear is the
//! decrement, and they cannot go out of balance.
//!
//! A fade target may also be *nothing*: [`TemporalFader::fade_out`] blends
//! the active resource away the same way a crossfade would, leaving the
//! fader empty once the blend completes.
//!
//! Render-thread only; [`TemporalFader::update`] is called at most once per
//! frame with a monotonic `dt`.

use std::sync::Arc;

use crate::errors::{CacheError, Result};

/// A fade destination: a resource, or nothing (fade out).
type FadeTarget<T> = Option<Arc<T>>;

/// Three-slot temporal crossfader.
///
/// Invariants:
/// - `queued` occupied implies `fading` occupied.
/// - `blend` is 1.0 whenever no fade is in flight.
/// - No slot holds the same resource twice (identity is `Arc::ptr_eq`).
#[derive(Debug)]
pub struct TemporalFader<T> {
    active: FadeTarget<T>,
    fading: Option<FadeTarget<T>>,
    queued: Option<FadeTarget<T>>,
    blend: f32,
    fade_rate: f32,
}

impl<T> TemporalFader<T> {
    /// Creates an empty fader fading at `fade_rate` blend units per second.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidArgument`] if `fade_rate` is not a positive
    /// finite number.
    pub fn new(fade_rate: f32) -> Result<Self> {
        validate_fade_rate(fade_rate)?;
        Ok(Self {
            active: None,
            fading: None,
            queued: None,
            blend: 1.0,
            fade_rate,
        })
    }

    /// Creates an empty fader configured from [`CacheSettings`].
    pub fn from_settings(settings: &crate::settings::CacheSettings) -> Result<Self> {
        Self::new(settings.fade_rate)
    }

    /// Changes the fade speed. Does not affect a fade already in flight
    /// beyond its remaining duration.
    pub fn set_fade_rate(&mut self, fade_rate: f32) -> Result<()> {
        validate_fade_rate(fade_rate)?;
        self.fade_rate = fade_rate;
        Ok(())
    }

    /// Request a crossfade to `resource`.
    ///
    /// - No-op if `resource` is already the active or the fading resource.
    /// - If nothing is fading, `resource` becomes the fading target and the
    ///   blend resets to 1.0.
    /// - If a fade is in flight, `resource` replaces whatever was queued
    ///   (single slot, last request wins).
    pub fn fade_to(&mut self, resource: Arc<T>) {
        self.request_fade(Some(resource));
    }

    /// Request a fade to nothing: the active resource blends away and the
    /// fader ends up empty. Same no-op and queueing rules as
    /// [`fade_to`](Self::fade_to).
    pub fn fade_out(&mut self) {
        self.request_fade(None);
    }

    fn request_fade(&mut self, target: FadeTarget<T>) {
        if Self::same_target(self.active.as_ref(), target.as_ref()) {
            return;
        }
        if let Some(fading) = &self.fading {
            if Self::same_target(fading.as_ref(), target.as_ref()) {
                return;
            }
            self.queued = Some(target);
        } else {
            self.fading = Some(target);
            self.blend = 1.0;
        }
    }

    /// Advance the fade by `dt` seconds.
    ///
    /// Promotes fading→active and queued→fading each time the blend crosses
    /// zero, adding 1.0 back per completed fade, so one large `dt` absorbs
    /// multiple completed fades identically to many small updates.
    pub fn update(&mut self, dt: f32) {
        if self.fading.is_none() {
            return;
        }
        self.blend -= self.fade_rate * dt;
        while self.blend <= 0.0 {
            if let Some(target) = self.fading.take() {
                self.active = target;
            }
            self.fading = self.queued.take();
            if self.fading.is_some() {
                self.blend += 1.0;
            } else {
                self.blend = 1.0;
                break;
            }
        }
    }

    /// Remove `resource` from whichever slot holds it.
    ///
    /// Remaining slots shift down (active←fading←queued) so the
    /// queued-implies-fading invariant holds. Used when a resource becomes
    /// permanently invalid (e.g. its owner was destroyed).
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidReference`] if no slot holds `resource`.
    pub fn drop_resource(&mut self, resource: &Arc<T>) -> Result<()> {
        if Self::target_is(self.queued.as_ref(), resource) {
            self.queued = None;
        } else if Self::target_is(self.fading.as_ref(), resource) {
            self.fading = self.queued.take();
            if self.fading.is_none() {
                self.blend = 1.0;
            }
        } else if self.active.as_ref().is_some_and(|r| Arc::ptr_eq(r, resource)) {
            self.active = self.fading.take().flatten();
            self.fading = self.queued.take();
            if self.fading.is_none() {
                self.blend = 1.0;
            }
        } else {
            return Err(CacheError::InvalidReference(
                "resource not held by any fader slot",
            ));
        }
        Ok(())
    }

    /// Clear all slots and reset the blend.
    pub fn drop_all(&mut self) {
        self.active = None;
        self.fading = None;
        self.queued = None;
        self.blend = 1.0;
    }

    /// The fully faded-in resource, drawn at weight `blend`.
    #[must_use]
    pub fn active(&self) -> Option<&Arc<T>> {
        self.active.as_ref()
    }

    /// The resource fading in, drawn at weight `1.0 - blend`.
    ///
    /// `None` during a fade-out even though [`is_fading`](Self::is_fading)
    /// is true: the fade is in flight with nothing as its target.
    #[must_use]
    pub fn fading(&self) -> Option<&Arc<T>> {
        self.fading.as_ref().and_then(Option::as_ref)
    }

    /// The resource waiting for the current fade to finish.
    #[must_use]
    pub fn queued(&self) -> Option<&Arc<T>> {
        self.queued.as_ref().and_then(Option::as_ref)
    }

    /// Current blend factor. Meaningful while a fade is in flight; rests at
    /// 1.0 otherwise.
    #[must_use]
    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Whether a crossfade is in flight.
    #[must_use]
    pub fn is_fading(&self) -> bool {
        self.fading.is_some()
    }

    fn same_target(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn target_is(slot: Option<&FadeTarget<T>>, resource: &Arc<T>) -> bool {
        slot.is_some_and(|target| Self::same_target(target.as_ref(), Some(resource)))
    }
}

fn validate_fade_rate(fade_rate: f32) -> Result<()> {
    if fade_rate.is_finite() && fade_rate > 0.0 {
        Ok(())
    } else {
        Err(CacheError::InvalidArgument {
            context: "fade rate must be positive and finite",
            value: f64::from(fade_rate),
        })
    }
}
