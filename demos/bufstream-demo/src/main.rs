//! Demonstrations of `bufstream-rs` features.
//!
//! Run with: `cargo run -p bufstream-demo`

use bufstream_rs::{BufferedStream, ByteSource, Config, EMBEDDED_AUDIO_CONFIG, HIGH_THROUGHPUT_CONFIG};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt::init();

    println!("=== bufstream-rs Demo ===\n");

    demo_basic_usage();
    demo_hysteresis_readiness();
    demo_backpressure();
    demo_non_blocking_mode();
    demo_configuration_presets();
    demo_graceful_shutdown();

    println!("\n=== All demos completed ===");
}

/// A source that yields fixed-size chunks of in-memory bytes, pacing
/// itself with a small sleep to make producer/consumer interleaving
/// visible rather than instantaneous.
struct PacedSource {
    data: Vec<u8>,
    cursor: AtomicUsize,
    chunk: usize,
    pace: Duration,
}

impl PacedSource {
    fn new(data: Vec<u8>, chunk: usize, pace: Duration) -> Self {
        Self { data, cursor: AtomicUsize::new(0), chunk, pace }
    }
}

impl ByteSource for PacedSource {
    fn read(&self, dst: &mut [u8]) -> usize {
        thread::sleep(self.pace);
        let start = self.cursor.load(Ordering::Acquire);
        if start >= self.data.len() {
            return 0;
        }
        let want = dst.len().min(self.chunk).min(self.data.len() - start);
        dst[..want].copy_from_slice(&self.data[start..start + want]);
        self.cursor.store(start + want, Ordering::Release);
        want
    }

    fn close(&self) {}

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

fn drain_all(stream: &BufferedStream, total_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(total_len);
    let mut buf = [0u8; 256];
    while out.len() < total_len {
        let n = stream.read(&mut buf);
        if n == 0 {
            thread::sleep(Duration::from_millis(1));
            continue;
        }
        out.extend_from_slice(&buf[..n]);
    }
    out
}

/// Demo 1: open a stream, read it to completion, close it.
fn demo_basic_usage() {
    println!("--- Demo 1: Basic Usage ---");
    let stream = BufferedStream::new(Config::default());
    let data: Vec<u8> = (0..4096u32).map(|i| i as u8).collect();
    stream.open(Arc::new(PacedSource::new(data.clone(), 512, Duration::from_micros(200))));

    let out = drain_all(&stream, data.len());
    println!("  read {} bytes, source reported size {}", out.len(), stream.size());
    stream.close();
}

/// Demo 2: watch `is_ready`/`is_not_ready` flip with hysteresis instead of
/// chattering at the exact byte count of a single threshold.
fn demo_hysteresis_readiness() {
    println!("--- Demo 2: Hysteresis Readiness ---");
    let config = Config::new(2048, 512, 256, 1024, 256, false, true);
    let stream = Arc::new(BufferedStream::new(config));
    stream.open(Arc::new(PacedSource::new(vec![1u8; 8192], 256, Duration::from_micros(300))));

    for _ in 0..6 {
        println!("  ready={} not_ready={}", stream.is_ready(), stream.is_not_ready());
        thread::sleep(Duration::from_millis(5));
    }
    stream.close();
}

/// Demo 3: a slow consumer lets the producer fill the ring and pause; the
/// transfer still completes once the consumer catches up.
fn demo_backpressure() {
    println!("--- Demo 3: Backpressure ---");
    let config = Config::new(1024, 256, 128, 512, 128, true, true);
    let stream = BufferedStream::new(config);
    let data = vec![7u8; 16 * 1024];
    stream.open(Arc::new(PacedSource::new(data.clone(), 128, Duration::from_micros(50))));

    // Let the producer run ahead and park on the full buffer before we
    // read anything at all.
    thread::sleep(Duration::from_millis(20));
    let out = drain_all(&stream, data.len());
    println!("  recovered {} bytes after a stalled start", out.len());
    stream.close();
}

/// Demo 4: `wait_for_ready = false` never blocks; callers poll instead.
fn demo_non_blocking_mode() {
    println!("--- Demo 4: Non-blocking Mode ---");
    let config = Config::new(1024, 256, 128, 512, 128, false, true);
    let stream = BufferedStream::new(config);
    stream.open(Arc::new(PacedSource::new(vec![3u8; 2048], 128, Duration::from_micros(100))));

    let mut polls = 0;
    let mut got = 0;
    let mut buf = [0u8; 64];
    while got < 2048 {
        let n = stream.read(&mut buf);
        polls += 1;
        got += n;
    }
    println!("  delivered 2048 bytes over {polls} non-blocking poll(s)");
    stream.close();
}

/// Demo 5: the two bundled presets, shown side by side.
fn demo_configuration_presets() {
    println!("--- Demo 5: Configuration Presets ---");
    for (name, cfg) in [("embedded audio", EMBEDDED_AUDIO_CONFIG), ("high throughput", HIGH_THROUGHPUT_CONFIG)] {
        println!(
            "  {name}: buffer_size={} read_size={} ready_threshold={} not_ready_threshold={}",
            cfg.buffer_size, cfg.read_size, cfg.ready_threshold, cfg.not_ready_threshold
        );
    }
}

/// Demo 6: close() reliably unblocks a reader parked on a source that
/// never produces enough to become ready.
fn demo_graceful_shutdown() {
    println!("--- Demo 6: Graceful Shutdown ---");
    let config = Config::new(4096, 1024, 256, 2048, 512, true, false);
    let stream = Arc::new(BufferedStream::new(config));
    stream.open(Arc::new(PacedSource::new(vec![1u8; 64], 32, Duration::from_millis(5))));

    let reader = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || {
            let mut buf = [0u8; 16];
            stream.read(&mut buf)
        })
    };

    thread::sleep(Duration::from_millis(30));
    println!("  closing while a reader is parked below ready_threshold...");
    stream.close();
    let n = reader.join().unwrap();
    println!("  reader returned with {n} bytes");
}
