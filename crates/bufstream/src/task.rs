//! The background producer thread wrapper.

use std::thread::JoinHandle;

/// A named, joinable background thread.
///
/// Wraps `std::thread::Builder` so the producer thread shows up under its
/// own name in a debugger or panic message instead of `<unnamed>`.
pub(crate) struct Task {
    handle: Option<JoinHandle<()>>,
}

impl Task {
    pub(crate) fn spawn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name(name.into())
            .spawn(f)
            .expect("failed to spawn BufferedStream producer thread");
        Self { handle: Some(handle) }
    }

    /// Blocks until the thread exits. A no-op if already joined or never
    /// spawned. Swallows a panic in the producer rather than propagating it
    /// to the caller of `close`.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        self.join();
    }
}
