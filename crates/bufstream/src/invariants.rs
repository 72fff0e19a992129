//! Debug assertion macros for the ring buffer's coordination invariants.
//!
//! These macros provide runtime checks for the invariants documented on
//! [`crate::BufferedStream`]. They are only active in debug builds
//! (`#[cfg(debug_assertions)]`), so there is zero overhead in release
//! builds.

// =============================================================================
// INV-RING-01: Bounded Availability
// =============================================================================

/// Assert that `available` never exceeds capacity.
///
/// **Invariant**: `0 <= available <= buffer_size`
///
/// Used in: `Ring::commit_write`, `Ring::commit_read`
macro_rules! debug_assert_bounded_available {
    ($available:expr, $capacity:expr) => {
        debug_assert!(
            $available <= $capacity,
            "INV-RING-01 violated: available {} exceeds capacity {}",
            $available,
            $capacity
        )
    };
}

// =============================================================================
// INV-RING-02: Cursor Range
// =============================================================================

/// Assert that a cursor stays within `[0, capacity)`.
///
/// **Invariant**: `read_ptr, write_ptr in [0, buffer_size)`
macro_rules! debug_assert_cursor_in_range {
    ($name:literal, $cursor:expr, $capacity:expr) => {
        debug_assert!(
            $cursor < $capacity,
            "INV-RING-02 violated: {} cursor {} outside [0, {})",
            $name,
            $cursor,
            $capacity
        )
    };
}

// =============================================================================
// INV-RING-03: Monotonic Read Total
// =============================================================================

/// Assert that `read_total` only increases.
///
/// **Invariant**: `new_read_total >= old_read_total`
macro_rules! debug_assert_monotonic_read_total {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "INV-RING-03 violated: read_total decreased from {} to {}",
            $old,
            $new
        )
    };
}

// =============================================================================
// INV-HYS-01: Ready Edge Signaled Once
// =============================================================================

/// Assert that the ready semaphore is only signaled on a rising crossing of
/// `ready_threshold`, never on a level that was already at or above it.
///
/// **Invariant**: `signal_ready => (before < ready_threshold && after >= ready_threshold)`
macro_rules! debug_assert_rising_edge {
    ($before:expr, $after:expr, $threshold:expr) => {
        debug_assert!(
            $before < $threshold && $after >= $threshold,
            "INV-HYS-01 violated: ready signal fired outside a rising edge (before {}, after {}, threshold {})",
            $before,
            $after,
            $threshold
        )
    };
}

// =============================================================================
// INV-SHUT-01: Space Signal On Shutdown
// =============================================================================

/// Assert that `close` posts the space-available semaphore so a parked
/// producer observes shutdown instead of sleeping forever.
///
/// **Invariant**: `close() => space_available.signal()`
macro_rules! debug_assert_producer_woken {
    ($woken:expr) => {
        debug_assert!($woken, "INV-SHUT-01 violated: close() did not wake a parked producer")
    };
}

pub(crate) use debug_assert_bounded_available;
pub(crate) use debug_assert_cursor_in_range;
pub(crate) use debug_assert_monotonic_read_total;
pub(crate) use debug_assert_producer_woken;
pub(crate) use debug_assert_rising_edge;
