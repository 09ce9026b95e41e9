//! Cache Settings
//!
//! Tunables for the cache subsystem, consumed once at construction of the
//! individual components. Runtime changes go through the components' own
//! setters (which validate), not through this struct.
//!
//! # Example
//!
//! ```rust,ignore
//! use glint::CacheSettings;
//!
//! let settings = CacheSettings {
//!     fade_rate: 2.0, // crossfades complete in half a second
//!     ..Default::default()
//! };
//! ```

/// Global configuration for the cache subsystem.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Crossfade speed in blend units per second.
    ///
    /// A rate of `1.0` completes one fade per second. Must be positive.
    pub fade_rate: f32,

    /// Distance in meters the tracked position may drift before cached
    /// shadow data is marked dirty.
    pub move_threshold: f32,

    /// Angle in radians either tracked orientation may drift before cached
    /// shadow data is marked dirty. Defaults to roughly one degree.
    pub rotate_threshold: f32,

    /// Rays traced per GI probe. Minimum 16.
    pub rays_per_probe: u32,

    /// Probes packed per atlas row.
    pub probes_per_line: u32,

    /// Total GI probes. Minimum 64.
    pub probe_count: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            fade_rate: 1.0,
            move_threshold: 0.1,
            rotate_threshold: 1.0_f32.to_radians(),
            rays_per_probe: 64,
            probes_per_line: 8,
            probe_count: 4096,
        }
    }
}
