//! The bounded, flow-controlled ring buffer itself.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::invariants::{debug_assert_bounded_available, debug_assert_producer_woken, debug_assert_rising_edge};
use crate::ring::{ReadTotal, Ring};
use crate::semaphore::Semaphore;
use crate::source::ByteSource;
use crate::task::Task;

/// Adapts a blocking [`ByteSource`] into a flow-controlled byte stream.
///
/// Internally this runs a background thread that drains the source into a
/// fixed ring buffer, pausing when the buffer is near full and resuming
/// once a consumer has made room. Consumers observe a hysteresis-based
/// readiness signal (see [`BufferedStream::is_ready`]) rather than a raw
/// byte count, so a fast consumer draining right at the edge of the
/// threshold doesn't flap between ready and not-ready on every byte.
///
/// All methods take `&self`; a `BufferedStream` is meant to be shared
/// behind an `Arc` between the thread that calls `open`/`close` and the
/// thread that calls `read`/`skip`.
pub struct BufferedStream {
    shared: Arc<Shared>,
    source: Mutex<Option<Arc<dyn ByteSource>>>,
    worker: Mutex<Option<Task>>,
}

struct Shared {
    buffer: Mutex<Buffer>,
    available: AtomicUsize,
    ready_latched: AtomicBool,
    running: AtomicBool,
    terminated: AtomicBool,
    space_available: Semaphore,
    ready: Semaphore,
    source_size: AtomicU64,
    config: Config,
}

struct Buffer {
    ring: Ring,
    read_total: ReadTotal,
}

const UNKNOWN_SOURCE_SIZE: u64 = u64::MAX;

impl Shared {
    fn note_available_increased(&self, old: usize, new: usize) {
        debug_assert_bounded_available!(new, self.config.buffer_size);
        if old < self.config.ready_threshold && new >= self.config.ready_threshold {
            debug_assert_rising_edge!(old, new, self.config.ready_threshold);
            let was_ready = self.ready_latched.swap(true, Ordering::AcqRel);
            if !was_ready {
                tracing::trace!(available = new, threshold = self.config.ready_threshold, "stream became ready");
                self.ready.signal();
            }
        }
    }

    fn note_available_decreased(&self, old: usize, new: usize) {
        if old > self.config.not_ready_threshold && new <= self.config.not_ready_threshold {
            tracing::trace!(available = new, threshold = self.config.not_ready_threshold, "stream became not ready");
            self.ready_latched.store(false, Ordering::Release);
        }
    }
}

impl BufferedStream {
    /// Builds a new, unopened stream with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let shared = Arc::new(Shared {
            buffer: Mutex::new(Buffer { ring: Ring::new(config.buffer_size), read_total: ReadTotal::default() }),
            available: AtomicUsize::new(0),
            ready_latched: AtomicBool::new(false),
            running: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            space_available: Semaphore::new(0),
            ready: Semaphore::new(0),
            source_size: AtomicU64::new(UNKNOWN_SOURCE_SIZE),
            config,
        });
        Self { shared, source: Mutex::new(None), worker: Mutex::new(None) }
    }

    /// Arms the stream with a new source and starts the background producer
    /// thread. Returns `false` without effect if the stream is already
    /// open.
    pub fn open(&self, source: Arc<dyn ByteSource>) -> bool {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.shared.terminated.store(false, Ordering::Release);
        self.shared.source_size.store(source.size().map_or(UNKNOWN_SOURCE_SIZE, |n| n), Ordering::Release);
        self.shared.space_available.reopen();
        self.shared.ready.reopen();
        self.reset_state();

        *self.source.lock().unwrap() = Some(Arc::clone(&source));
        let shared = Arc::clone(&self.shared);
        let task = Task::spawn("bufstream-producer", move || producer_loop(&shared, source.as_ref()));
        *self.worker.lock().unwrap() = Some(task);
        tracing::info!(buffer_size = self.shared.config.buffer_size, "stream opened");
        true
    }

    /// Stops the producer, unblocks any waiting consumer, and joins the
    /// background thread. Idempotent: calling `close` on an already-closed
    /// stream does nothing.
    pub fn close(&self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }

        self.shared.terminated.store(true, Ordering::Release);
        if let Some(source) = self.source.lock().unwrap().take() {
            source.close();
        }
        let woke_producer = self.shared.space_available.close();
        debug_assert_producer_woken!(woke_producer);
        self.shared.ready.close();

        if let Some(mut task) = self.worker.lock().unwrap().take() {
            task.join();
        }
        self.reset_state();
        tracing::info!("stream closed");
    }

    /// Zeroes `available`, the readiness latch, and the ring's cursors and
    /// read-total counter. Shared by `open` (arming a fresh session) and
    /// `close` (so stale bytes from a prior session are never visible to a
    /// `read`/`skip` call that lands between `close` and the next `open`).
    fn reset_state(&self) {
        self.shared.available.store(0, Ordering::Release);
        self.shared.ready_latched.store(false, Ordering::Release);
        let mut buffer = self.shared.buffer.lock().unwrap();
        buffer.ring.reset();
        buffer.read_total.reset();
    }

    /// Copies a single contiguous span of up to `dst.len()` bytes into
    /// `dst`. Blocks until the stream is ready (if `wait_for_ready` is
    /// configured) but never blocks past that point: a short read — even
    /// one far shorter than `dst.len()` because the valid region happens to
    /// wrap right after `read_ptr` — is expected and is not an error. A
    /// caller that wants everything currently available must call `read`
    /// again rather than assume one call drains a full contiguous run.
    ///
    /// Returns `0` if the stream is not open, and once the source is
    /// exhausted and every buffered byte has been delivered.
    pub fn read(&self, dst: &mut [u8]) -> usize {
        if dst.is_empty() || !self.shared.running.load(Ordering::Acquire) {
            return 0;
        }
        self.wait_until_readable();

        let n = {
            let mut buffer = self.shared.buffer.lock().unwrap();
            let available = self.shared.available.load(Ordering::Acquire);
            let n = buffer.ring.copy_out(dst, available);
            if n > 0 {
                buffer.read_total.add(n);
            }
            n
        };
        if n > 0 {
            self.release(n);
        }
        n
    }

    /// Discards a single contiguous span of up to `len` bytes from the
    /// front of the stream without copying them anywhere. Same single-span
    /// and blocking behavior as [`BufferedStream::read`].
    pub fn skip(&self, len: usize) -> usize {
        if len == 0 || !self.shared.running.load(Ordering::Acquire) {
            return 0;
        }
        self.wait_until_readable();

        let n = {
            let mut buffer = self.shared.buffer.lock().unwrap();
            let available = self.shared.available.load(Ordering::Acquire);
            let n = buffer.ring.skip(len, available);
            if n > 0 {
                buffer.read_total.add(n);
            }
            n
        };
        if n > 0 {
            self.release(n);
        }
        n
    }

    /// `true` iff `available >= ready_threshold`. A lock-free threshold
    /// comparison, not an edge-triggered latch: this and
    /// [`BufferedStream::is_not_ready`] are independent predicates with a
    /// band between `not_ready_threshold` and `ready_threshold` where
    /// neither holds.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.shared.available.load(Ordering::Acquire) >= self.shared.config.ready_threshold
    }

    /// `true` iff `available <= not_ready_threshold`. See
    /// [`BufferedStream::is_ready`] for why this is not simply its
    /// negation.
    #[must_use]
    pub fn is_not_ready(&self) -> bool {
        self.shared.available.load(Ordering::Acquire) <= self.shared.config.not_ready_threshold
    }

    /// Total bytes delivered to callers of `read`/`skip` since the last
    /// `open`.
    #[must_use]
    pub fn position(&self) -> usize {
        self.shared.buffer.lock().unwrap().read_total.get()
    }

    /// The source's total size in bytes, or `0` if the source didn't
    /// report one.
    #[must_use]
    pub fn size(&self) -> usize {
        match self.shared.source_size.load(Ordering::Acquire) {
            UNKNOWN_SOURCE_SIZE => 0,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        }
    }

    /// Blocks while the stream is below the readiness latch, per
    /// `wait_for_ready`. Deliberately checks `ready_latched` rather than
    /// the public [`BufferedStream::is_ready`]: the latch is what the
    /// rising-edge `ready` semaphore signals, so waiting on anything else
    /// could park forever inside the hysteresis band (`is_ready()` false
    /// but no further rising edge coming until a full drain-and-refill).
    fn wait_until_readable(&self) {
        if !self.shared.config.wait_for_ready {
            return;
        }
        while !self.shared.ready_latched.load(Ordering::Acquire) {
            if !self.shared.ready.wait() {
                break;
            }
        }
    }

    /// Records `n` bytes freed from the ring and wakes a parked producer.
    fn release(&self, n: usize) {
        let old = self.shared.available.fetch_sub(n, Ordering::AcqRel);
        let new = old - n;
        self.shared.note_available_decreased(old, new);
        self.shared.space_available.signal();
    }
}

impl Default for BufferedStream {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Drop for BufferedStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// The background producer loop: pulls chunks from `source` into the ring
/// until told to stop.
fn producer_loop(shared: &Arc<Shared>, source: &dyn ByteSource) {
    let config = shared.config;
    let headroom_floor = config.headroom_floor();
    tracing::debug!(buffer_size = config.buffer_size, read_size = config.read_size, "producer started");

    loop {
        if shared.terminated.load(Ordering::Acquire) {
            break;
        }

        let available = shared.available.load(Ordering::Acquire);
        if available >= headroom_floor {
            if !shared.space_available.wait() {
                break;
            }
            continue;
        }

        let n = {
            let mut buffer = shared.buffer.lock().unwrap();
            let free = config.buffer_size - shared.available.load(Ordering::Acquire);
            buffer.ring.write_with(config.read_size, free, |dst| source.read(dst))
        };

        if n == 0 {
            if config.end_with_source {
                tracing::debug!("source exhausted, producer terminating");
                shared.terminated.store(true, Ordering::Release);
                shared.ready.close();
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
            continue;
        }

        let old = shared.available.fetch_add(n, Ordering::AcqRel);
        shared.note_available_increased(old, old + n);
    }

    tracing::debug!("producer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::source::test_support::{BlockingSource, SliceSource};
    use std::time::Duration;

    fn small_config() -> Config {
        Config::new(16, 4, 4, 8, 2, true, true)
    }

    #[test]
    fn reads_back_everything_written() {
        let stream = BufferedStream::new(small_config());
        let data: Vec<u8> = (0..40u8).collect();
        stream.open(Arc::new(SliceSource::new(data.clone(), 4)));

        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        let mut stalls = 0;
        while out.len() < data.len() {
            let n = stream.read(&mut buf);
            if n == 0 {
                stalls += 1;
                assert!(stalls < 1000, "stream stopped producing before delivering all bytes");
                std::thread::sleep(Duration::from_millis(2));
                continue;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data);
        assert_eq!(stream.position(), data.len());
    }

    #[test]
    fn skip_advances_position_without_output() {
        let stream = BufferedStream::new(small_config());
        stream.open(Arc::new(SliceSource::new((0..16u8).collect(), 4)));
        let n = stream.skip(5);
        assert!(n > 0);
        assert_eq!(stream.position(), n);
    }

    #[test]
    fn open_twice_is_rejected_until_closed() {
        let stream = BufferedStream::new(small_config());
        assert!(stream.open(Arc::new(SliceSource::new(vec![1, 2, 3], 4))));
        assert!(!stream.open(Arc::new(SliceSource::new(vec![4, 5, 6], 4))));
        stream.close();
        assert!(stream.open(Arc::new(SliceSource::new(vec![7, 8, 9], 4))));
    }

    #[test]
    fn close_unblocks_a_reader_waiting_on_a_stalled_source() {
        let stream = Arc::new(BufferedStream::new(small_config()));
        stream.open(Arc::new(BlockingSource::default()));

        let reader = {
            let stream = Arc::clone(&stream);
            std::thread::spawn(move || {
                let mut buf = [0u8; 4];
                stream.read(&mut buf)
            })
        };

        std::thread::sleep(Duration::from_millis(20));
        stream.close();
        let n = reader.join().unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn is_ready_and_is_not_ready_are_independent_threshold_checks() {
        // ready_threshold = 8, not_ready_threshold = 2: reading down to an
        // available count of 6 lands strictly inside the hysteresis band,
        // where neither predicate should hold.
        let stream = BufferedStream::new(Config::new(16, 4, 16, 8, 2, false, true));
        stream.open(Arc::new(SliceSource::new(vec![0u8; 16], 16)));
        while !stream.is_ready() {
            std::thread::sleep(Duration::from_millis(1));
        }

        let mut buf = [0u8; 10];
        stream.read(&mut buf);
        assert_eq!(stream.position(), 10);
        assert!(!stream.is_ready(), "available (6) fell below ready_threshold (8)");
        assert!(!stream.is_not_ready(), "available (6) is still above not_ready_threshold (2)");
    }

    #[test]
    fn read_returns_zero_when_not_open() {
        let stream = BufferedStream::new(small_config());
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf), 0);
        assert_eq!(stream.skip(4), 0);
    }

    #[test]
    fn read_after_close_does_not_see_stale_bytes() {
        let stream = BufferedStream::new(small_config());
        stream.open(Arc::new(SliceSource::new(vec![1u8; 16], 16)));
        let mut buf = [0u8; 8];
        let mut stalls = 0;
        while stream.read(&mut buf) == 0 {
            stalls += 1;
            assert!(stalls < 1000);
            std::thread::sleep(Duration::from_millis(1));
        }
        stream.close();

        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf), 0);
        assert_eq!(stream.skip(1), 0);
        assert_eq!(stream.position(), 0);
    }
}
