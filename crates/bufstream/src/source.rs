//! The pluggable external byte source.

/// A blocking byte source that a [`crate::BufferedStream`] drains on a
/// background thread.
///
/// Implementations are expected to block the calling (producer) thread
/// until at least one byte is available or the source is exhausted; a
/// `ByteSource` that busy-polls defeats the point of running it off the
/// caller's thread.
///
/// `Send + Sync` because the stream holds it behind an `Arc` shared with the
/// background thread.
pub trait ByteSource: Send + Sync {
    /// Blocks until data is available, end-of-source is reached, or the
    /// source is closed, then copies into `dst` and returns the number of
    /// bytes written.
    ///
    /// Returns `0` to signal end-of-source. Implementations must return
    /// promptly once [`ByteSource::close`] has been called, even from
    /// inside a blocking read.
    fn read(&self, dst: &mut [u8]) -> usize;

    /// Requests that a blocked [`ByteSource::read`] return as soon as
    /// possible. Called at most once per stream lifetime, from `close()`.
    fn close(&self);

    /// The total size of the source in bytes, if known ahead of time.
    fn size(&self) -> Option<u64> {
        None
    }
}
