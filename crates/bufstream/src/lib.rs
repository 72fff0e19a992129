//! A bounded, flow-controlled ring buffer that adapts a blocking byte
//! source into a decoupled byte stream.
//!
//! [`BufferedStream`] runs a background thread that drains a [`ByteSource`]
//! into a fixed-size ring buffer, pausing the producer when the buffer
//! fills up and waking it again once a consumer frees space. Consumers see
//! a hysteresis-based readiness signal ([`BufferedStream::is_ready`]) so
//! the buffer doesn't flap between ready and not-ready on every byte near
//! a threshold.
//!
//! ```no_run
//! use bufstream_rs::{BufferedStream, Config};
//! use std::sync::Arc;
//!
//! # struct MySource;
//! # impl bufstream_rs::ByteSource for MySource {
//! #     fn read(&self, dst: &mut [u8]) -> usize { let _ = dst; 0 }
//! #     fn close(&self) {}
//! # }
//! let stream = BufferedStream::new(Config::default());
//! stream.open(Arc::new(MySource));
//! let mut buf = [0u8; 4096];
//! let n = stream.read(&mut buf);
//! stream.close();
//! # let _ = n;
//! ```

mod config;
mod error;
mod invariants;
mod ring;
mod semaphore;
mod source;
mod stream;
mod task;

pub use config::{Config, EMBEDDED_AUDIO_CONFIG, HIGH_THROUGHPUT_CONFIG};
pub use error::ConfigError;
pub use source::ByteSource;
pub use stream::BufferedStream;
