//! Threshold-Based Change Tracking
//!
//! Cached shadow and GI data only needs recomputing when the underlying
//! scene state drifts far enough to matter visually. This module remembers a
//! baseline per tracked quantity and raises a dirty flag once the current
//! value reaches its threshold, at which point that quantity's baseline is
//! recaptured.
//!
//! The comparison itself is factored into two small comparator types,
//! [`DistanceThreshold`] and [`AngleThreshold`], composed per quantity.

use glam::{Quat, Vec3};

/// Positional drift comparator.
///
/// Exceeded when the current position is `threshold` meters or more from
/// the baseline.
#[derive(Debug, Clone, Copy)]
pub struct DistanceThreshold {
    baseline: Vec3,
    threshold: f32,
}

impl DistanceThreshold {
    #[must_use]
    pub fn new(baseline: Vec3, threshold: f32) -> Self {
        Self {
            baseline,
            threshold,
        }
    }

    /// Whether `current` drifted to or past the threshold.
    #[must_use]
    pub fn exceeded(&self, current: Vec3) -> bool {
        current.distance_squared(self.baseline) >= self.threshold * self.threshold
    }

    /// Re-capture the baseline at `current`.
    pub fn rebaseline(&mut self, current: Vec3) {
        self.baseline = current;
    }

    #[must_use]
    pub fn baseline(&self) -> Vec3 {
        self.baseline
    }
}

/// Angular drift comparator.
///
/// Exceeded when the rotation between baseline and current orientation is
/// `threshold` radians or more.
#[derive(Debug, Clone, Copy)]
pub struct AngleThreshold {
    baseline: Quat,
    threshold: f32,
}

impl AngleThreshold {
    #[must_use]
    pub fn new(baseline: Quat, threshold: f32) -> Self {
        Self {
            baseline,
            threshold,
        }
    }

    /// Whether `current` drifted to or past the threshold.
    #[must_use]
    pub fn exceeded(&self, current: Quat) -> bool {
        self.baseline.angle_between(current) >= self.threshold
    }

    /// Re-capture the baseline at `current`.
    pub fn rebaseline(&mut self, current: Quat) {
        self.baseline = current;
    }

    #[must_use]
    pub fn baseline(&self) -> Quat {
        self.baseline
    }
}

/// Dirty tracker for the shadow/GI state of one logical object.
///
/// Tracks three quantities against independent baselines: position, primary
/// orientation (the object), and light orientation (e.g. the sun direction
/// relevant to its cached shadows).
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    position: DistanceThreshold,
    orientation: AngleThreshold,
    light_orientation: AngleThreshold,
    dirty: bool,
}

impl ChangeTracker {
    /// Creates a tracker with baselines at the given initial state.
    ///
    /// `move_threshold` is in meters, `rotate_threshold` in radians (both
    /// orientations share it). The tracker starts clean.
    #[must_use]
    pub fn new(
        position: Vec3,
        orientation: Quat,
        light_orientation: Quat,
        move_threshold: f32,
        rotate_threshold: f32,
    ) -> Self {
        Self {
            position: DistanceThreshold::new(position, move_threshold),
            orientation: AngleThreshold::new(orientation, rotate_threshold),
            light_orientation: AngleThreshold::new(light_orientation, rotate_threshold),
            dirty: false,
        }
    }

    /// Creates a tracker with thresholds taken from [`CacheSettings`].
    #[must_use]
    pub fn from_settings(
        settings: &crate::settings::CacheSettings,
        position: Vec3,
        orientation: Quat,
        light_orientation: Quat,
    ) -> Self {
        Self::new(
            position,
            orientation,
            light_orientation,
            settings.move_threshold,
            settings.rotate_threshold,
        )
    }

    /// Compare all three quantities against their baselines.
    ///
    /// Each check runs unconditionally — an earlier exceedance must not
    /// short-circuit the later ones, because every quantity rebaselines
    /// independently. Any exceedance sets the dirty flag and recaptures that
    /// quantity's baseline only.
    pub fn update(&mut self, position: Vec3, orientation: Quat, light_orientation: Quat) {
        if self.position.exceeded(position) {
            self.position.rebaseline(position);
            self.dirty = true;
        }
        if self.orientation.exceeded(orientation) {
            self.orientation.rebaseline(orientation);
            self.dirty = true;
        }
        if self.light_orientation.exceeded(light_orientation) {
            self.light_orientation.rebaseline(light_orientation);
            self.dirty = true;
        }
    }

    /// Unconditionally mark dirty.
    ///
    /// Conservative invalidation for structural scene edits (a static object
    /// appeared or vanished inside the cached region).
    pub fn notify_external_change(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag after the consumer recaptured its cached data.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Whether cached data derived from the tracked state is stale.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
