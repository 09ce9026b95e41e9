//! Error Types
//!
//! This module defines the error types used by the cache subsystem.
//!
//! # Overview
//!
//! The main error type [`CacheError`] covers all failure modes:
//! - Out-of-range construction or setter values (atomic: prior state is
//!   left untouched)
//! - Release or drop of handles the subsystem does not own
//! - Query kinds the current platform cannot execute
//! - GPU resource exhaustion
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, CacheError>`.

use thiserror::Error;

/// The main error type for the cache subsystem.
///
/// Deferred-reclaim failures are intentionally *not* represented here: they
/// are logged and swallowed on the render thread (see
/// [`DeferredReclaimer::process_pending`](crate::reclaim::DeferredReclaimer::process_pending)).
#[derive(Error, Debug)]
pub enum CacheError {
    /// A construction or setter value is out of range.
    ///
    /// The operation leaves prior state untouched, so configuration changes
    /// are atomic.
    #[error("Invalid argument: {context} (value: {value})")]
    InvalidArgument {
        /// Description of the rejected parameter.
        context: &'static str,
        /// The offending value, widened so float parameters report exactly.
        value: f64,
    },

    /// A handle was released or dropped that is not currently owned.
    ///
    /// This is a programming error in the caller and is always propagated,
    /// never swallowed.
    #[error("Invalid reference: {0}")]
    InvalidReference(&'static str),

    /// The requested operation is not supported on the current platform.
    ///
    /// Silently downgrading (e.g. running an any-hit query where a sample
    /// count was requested) would corrupt visibility decisions, so this
    /// always surfaces. The full system disables the dependent feature
    /// instead of crashing.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// GPU resource allocation failed.
    ///
    /// Treated as fatal by the surrounding renderer; nothing here attempts
    /// local recovery.
    #[error("GPU resource exhaustion: {0}")]
    ResourceExhaustion(String),
}

/// Alias for `Result<T, CacheError>`.
pub type Result<T> = std::result::Result<T, CacheError>;
