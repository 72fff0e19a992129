//! Configuration for a [`crate::BufferedStream`].

use crate::error::ConfigError;

/// Fixed-at-construction configuration for a [`crate::BufferedStream`].
///
/// All fields are immutable for the lifetime of the stream; there is no
/// setter API. Construct with [`Config::try_new`] (returns a `Result`) or
/// [`Config::new`] (panics on misconfiguration, for call sites that treat a
/// bad config as a programmer error).
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Total capacity of the ring, in bytes.
    pub buffer_size: usize,
    /// The producer sleeps once `available >= buffer_size - read_threshold`.
    pub read_threshold: usize,
    /// Size of each chunk the producer requests from the source.
    pub read_size: usize,
    /// `available` rising to this mark makes the stream "ready".
    pub ready_threshold: usize,
    /// `available` falling to or below this mark makes the stream "not ready".
    pub not_ready_threshold: usize,
    /// If true, `read`/`skip` block on the ready signal while not-ready.
    pub wait_for_ready: bool,
    /// If true, the producer terminates on source EOF instead of polling.
    pub end_with_source: bool,
}

impl Config {
    /// Validates and constructs a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any of the ordering/bound invariants in
    /// the buffer's data model are violated.
    pub fn try_new(
        buffer_size: usize,
        read_threshold: usize,
        read_size: usize,
        ready_threshold: usize,
        not_ready_threshold: usize,
        wait_for_ready: bool,
        end_with_source: bool,
    ) -> Result<Self, ConfigError> {
        if buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        if read_size == 0 || read_size > buffer_size {
            return Err(ConfigError::ReadSizeOutOfRange { read_size, buffer_size });
        }
        if read_threshold > buffer_size {
            return Err(ConfigError::ReadThresholdOutOfRange { read_threshold, buffer_size });
        }
        if ready_threshold > buffer_size {
            return Err(ConfigError::ReadyThresholdOutOfRange { ready_threshold, buffer_size });
        }
        if not_ready_threshold >= ready_threshold {
            return Err(ConfigError::NoHysteresisMargin { not_ready_threshold, ready_threshold });
        }

        Ok(Self {
            buffer_size,
            read_threshold,
            read_size,
            ready_threshold,
            not_ready_threshold,
            wait_for_ready,
            end_with_source,
        })
    }

    /// Validates and constructs a configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration violates an invariant. Use
    /// [`Config::try_new`] to handle this as a recoverable error instead.
    #[must_use]
    pub fn new(
        buffer_size: usize,
        read_threshold: usize,
        read_size: usize,
        ready_threshold: usize,
        not_ready_threshold: usize,
        wait_for_ready: bool,
        end_with_source: bool,
    ) -> Self {
        Self::try_new(
            buffer_size,
            read_threshold,
            read_size,
            ready_threshold,
            not_ready_threshold,
            wait_for_ready,
            end_with_source,
        )
        .expect("invalid BufferedStream configuration")
    }

    /// Headroom the producer keeps free before it goes to sleep.
    #[inline]
    #[must_use]
    pub const fn headroom_floor(&self) -> usize {
        self.buffer_size.saturating_sub(self.read_threshold)
    }
}

impl Default for Config {
    /// A general-purpose default: 64 KiB ring, 16 KiB read chunks, ready at
    /// a quarter full, not-ready at an eighth full, blocking reads, stream
    /// ends with the source.
    fn default() -> Self {
        Self::new(64 * 1024, 16 * 1024, 16 * 1024, 16 * 1024, 8 * 1024, true, true)
    }
}

/// Preset tuned for low-memory embedded audio decoders: small buffer, small
/// chunks, blocks until ready so the decoder never sees a starved read.
pub const EMBEDDED_AUDIO_CONFIG: Config =
    Config { buffer_size: 16 * 1024, read_threshold: 4 * 1024, read_size: 2 * 1024, ready_threshold: 8 * 1024, not_ready_threshold: 2 * 1024, wait_for_ready: true, end_with_source: true };

/// Preset tuned for fast local sources where large chunks amortize per-call
/// overhead and short reads are tolerable.
pub const HIGH_THROUGHPUT_CONFIG: Config = Config {
    buffer_size: 1024 * 1024,
    read_threshold: 256 * 1024,
    read_size: 256 * 1024,
    ready_threshold: 512 * 1024,
    not_ready_threshold: 128 * 1024,
    wait_for_ready: false,
    end_with_source: true,
};
