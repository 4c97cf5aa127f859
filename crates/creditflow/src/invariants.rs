//! Debug assertion macros for subscriber protocol invariants.
//!
//! These macros check the signal-ordering rules a well-behaved producer must
//! follow. They are only active in debug builds (`#[cfg(debug_assertions)]`),
//! so there is zero overhead in release builds; in release a misbehaving
//! producer is tolerated silently and the atomic termination guard still
//! prevents double-termination.

// =============================================================================
// Subscribe ordering
// =============================================================================

/// Assert that `on_subscribe` has not been delivered before.
///
/// **Invariant**: exactly one `on_subscribe` per stream session.
///
/// Used in: `BaseSubscriber::on_subscribe()`
macro_rules! debug_assert_first_subscribe {
    ($flag:expr) => {
        debug_assert!(
            !$flag.swap(true, std::sync::atomic::Ordering::Relaxed),
            "on_subscribe delivered twice to the same subscriber"
        )
    };
}

/// Assert that `on_subscribe` was delivered before this signal.
///
/// **Invariant**: `on_subscribe` precedes every other signal.
///
/// Used in: `BaseSubscriber::{on_next, on_complete, on_error}()`
macro_rules! debug_assert_subscribed {
    ($flag:expr) => {
        debug_assert!(
            $flag.load(std::sync::atomic::Ordering::Relaxed),
            "signal delivered before on_subscribe"
        )
    };
}

// =============================================================================
// Terminal-signal ordering
// =============================================================================

/// Assert that no terminal signal has been delivered before.
///
/// **Invariant**: at most one of `on_complete` / `on_error` per session.
/// Consumer-driven `cancel` is exempt — it may race any signal and is
/// resolved by the atomic handle exchange instead.
///
/// Used in: `BaseSubscriber::{on_complete, on_error}()`
macro_rules! debug_assert_first_terminal {
    ($flag:expr) => {
        debug_assert!(
            !$flag.swap(true, std::sync::atomic::Ordering::Relaxed),
            "duplicate terminal signal delivered to the same subscriber"
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_first_subscribe;
pub(crate) use debug_assert_first_terminal;
pub(crate) use debug_assert_subscribed;
