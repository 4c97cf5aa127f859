//! The four-signal consumer contract.

use crate::credits;
use crate::error::Failure;
use crate::subscription::Subscription;
use std::sync::Arc;

/// Consumer of a push stream.
///
/// A producer calls `on_subscribe` exactly once, then `on_next` zero or more
/// times, then at most one of `on_complete` / `on_error`. This raw trait does
/// not enforce that ordering — [`crate::BaseSubscriber`] does.
///
/// Methods take `&self` because signals may arrive on any thread; instances
/// are shared by reference (`Arc`) and never copied.
pub trait Subscriber<T>: Send + Sync {
    /// Receives the stream handle. Called exactly once, before any other signal.
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    /// Receives one item. Producers serialize `on_next` calls per session.
    fn on_next(&self, item: T);

    /// Receives successful completion. Terminal.
    fn on_complete(&self);

    /// Receives failure. Terminal.
    fn on_error(&self, failure: Failure);
}

/// Subscriber that requests an unbounded window and discards everything.
struct Discard;

impl<T> Subscriber<T> for Discard {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        subscription.request(credits::NO_FLOW_CONTROL);
    }

    fn on_next(&self, _item: T) {}
    fn on_complete(&self) {}
    fn on_error(&self, _failure: Failure) {}
}

/// Returns a subscriber that requests an unbounded window on subscribe and
/// silently discards every item and terminal signal.
///
/// Useful as a default sink when only the side effects of the producer matter.
pub fn discard<T: 'static>() -> Arc<dyn Subscriber<T>> {
    Arc::new(Discard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Probe {
        requested: AtomicI64,
        cancels: AtomicUsize,
    }

    impl Subscription for Probe {
        fn request(&self, n: i64) {
            self.requested.fetch_add(n, Ordering::SeqCst);
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_discard_requests_unbounded() {
        let probe = Arc::new(Probe::default());
        let subscriber = discard::<u64>();

        subscriber.on_subscribe(probe.clone());
        assert_eq!(probe.requested.load(Ordering::SeqCst), credits::NO_FLOW_CONTROL);

        // Signals after subscribe are inert.
        subscriber.on_next(1);
        subscriber.on_next(2);
        subscriber.on_complete();
        assert_eq!(probe.cancels.load(Ordering::SeqCst), 0);
    }
}
