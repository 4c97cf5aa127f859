//! Producer-side control handle.

/// Control surface a producer hands to its subscriber.
///
/// Implemented by the producer; this crate only calls it. Neither method
/// reports failure back through its return value — a producer that cannot
/// honor a request or cancellation signals through the subscriber's error
/// channel instead.
pub trait Subscription: Send + Sync {
    /// Asks the producer for up to `n` more items.
    ///
    /// Passing [`crate::credits::NO_FLOW_CONTROL`] lifts the limit for the
    /// remainder of the stream.
    fn request(&self, n: i64);

    /// Asks the producer to stop delivering items and release its resources.
    ///
    /// The producer's own teardown is asynchronous; items already in flight
    /// may still be delivered and are dropped by the subscriber side.
    fn cancel(&self);
}
