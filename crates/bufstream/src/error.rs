//! Error types.
//!
//! Per the buffer's error handling design, the public I/O surface
//! (`open`/`read`/`skip`/`close`) never raises exceptional control flow —
//! misuse and runtime failures are reported through `bool`/`0` returns.
//! [`ConfigError`] is the one place a `Result` is warranted, because a bad
//! configuration is a programmer error detectable before any I/O happens.

use thiserror::Error;

/// Errors returned by [`crate::Config::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `buffer_size` was zero.
    #[error("buffer_size must be greater than zero")]
    ZeroBufferSize,

    /// `read_size` was zero or exceeded `buffer_size`.
    #[error("read_size ({read_size}) must be in 1..=buffer_size ({buffer_size})")]
    ReadSizeOutOfRange {
        /// The rejected `read_size`.
        read_size: usize,
        /// The configured `buffer_size`.
        buffer_size: usize,
    },

    /// `read_threshold` exceeded `buffer_size`.
    #[error("read_threshold ({read_threshold}) must be <= buffer_size ({buffer_size})")]
    ReadThresholdOutOfRange {
        /// The rejected `read_threshold`.
        read_threshold: usize,
        /// The configured `buffer_size`.
        buffer_size: usize,
    },

    /// `ready_threshold` exceeded `buffer_size`.
    #[error("ready_threshold ({ready_threshold}) must be <= buffer_size ({buffer_size})")]
    ReadyThresholdOutOfRange {
        /// The rejected `ready_threshold`.
        ready_threshold: usize,
        /// The configured `buffer_size`.
        buffer_size: usize,
    },

    /// `not_ready_threshold >= ready_threshold`, eliminating hysteresis.
    #[error(
        "not_ready_threshold ({not_ready_threshold}) must be < ready_threshold ({ready_threshold})"
    )]
    NoHysteresisMargin {
        /// The configured `not_ready_threshold`.
        not_ready_threshold: usize,
        /// The configured `ready_threshold`.
        ready_threshold: usize,
    },
}
