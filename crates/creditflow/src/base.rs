#[cfg(debug_assertions)]
use crate::invariants::{
    debug_assert_first_subscribe, debug_assert_first_terminal, debug_assert_subscribed,
};
use crate::error::Failure;
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;
use arc_swap::ArcSwapOption;
use crossbeam_utils::CachePadded;
use std::marker::PhantomData;
use std::sync::Arc;
#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// TERMINATION PROTOCOL
// =============================================================================
//
// The only cross-thread mutable state is `subscription`: an atomically
// swappable shared reference to the producer's handle. It is `None` before
// subscription and after termination, and non-`None` exactly while the
// stream session is active.
//
// Every terminating operation (`on_complete`, `on_error`, `cancel`) performs
// a single atomic `swap(None)` and proceeds only if it observed a non-`None`
// previous value. Whichever call claims the handle "wins"; the others become
// no-ops. This is the linearization point for termination and the reason no
// lock is needed anywhere in the signal path.
//
// Non-terminating operations (`on_next`, `request`) take a load guard on the
// slot. The guard pins the handle for the duration of the call, so a racing
// `cancel` on another thread cannot release the producer's handle out from
// under an in-flight hook invocation.
//
// The producer is assumed to serialize its own signals (`on_next` and the
// terminal pair never race each other); consumer-driven `cancel` may race
// any of them.
//
// =============================================================================

/// Extension hooks invoked by [`BaseSubscriber`] once a signal has passed
/// protocol enforcement.
///
/// `flow` is the base's own guarded control surface: `request` and `cancel`
/// through it become no-ops once the stream has terminated, so hook bodies
/// never need to track termination themselves.
pub trait SubscriberHooks<T>: Send + Sync {
    /// The stream handle is stored; request initial credit here.
    fn on_subscribe(&self, flow: &dyn Subscription);

    /// One item arrived while the stream was active.
    fn on_next(&self, flow: &dyn Subscription, item: T);

    /// The stream completed. The handle has already been released.
    fn on_complete(&self);

    /// The stream failed. The handle has already been released.
    fn on_error(&self, failure: Failure);

    /// Invoked exactly once after either terminal hook or after a cancel;
    /// cleanup common to all three termination paths goes here.
    fn on_terminate(&self) {}
}

/// Protocol-enforcing wrapper turning a [`SubscriberHooks`] implementation
/// into a race-free [`Subscriber`].
///
/// Guarantees, under any interleaving of producer signals and consumer-side
/// `cancel` calls from arbitrary threads:
///
/// - exactly one of {complete, error, cancel-teardown} runs its hooks;
/// - items delivered after termination are dropped, never dispatched;
/// - `request`/`cancel` after termination are logged no-ops.
///
/// Also implements [`Subscription`]: the consumer-facing `request`/`cancel`
/// surface with the guarantees above.
///
/// The object is always alive for the duration of its own callbacks: every
/// caller necessarily holds a live reference across the call, which the
/// borrow checker enforces, so no scoped self-reference is taken.
pub struct BaseSubscriber<T, H> {
    hooks: H,
    /// Shared link to the producer. The swap to `None` is the termination
    /// linearization point; padded so terminating threads do not invalidate
    /// the cache line the item path mutates.
    subscription: CachePadded<ArcSwapOption<Link>>,
    #[cfg(debug_assertions)]
    got_subscribe: AtomicBool,
    #[cfg(debug_assertions)]
    got_terminal: AtomicBool,
    _items: PhantomData<fn(T)>,
}

/// Sized wrapper so the handle trait object sits behind the slot's thin pointer.
struct Link(Arc<dyn Subscription>);

impl<T, H> BaseSubscriber<T, H> {
    /// Wraps `hooks` in a fresh, unsubscribed base.
    pub fn new(hooks: H) -> Self {
        Self {
            hooks,
            subscription: CachePadded::new(ArcSwapOption::empty()),
            #[cfg(debug_assertions)]
            got_subscribe: AtomicBool::new(false),
            #[cfg(debug_assertions)]
            got_terminal: AtomicBool::new(false),
            _items: PhantomData,
        }
    }

    /// Returns `true` while a stream handle is held (subscribed, not yet
    /// terminated or cancelled).
    pub fn is_active(&self) -> bool {
        self.subscription.load().is_some()
    }
}

impl<T, H: SubscriberHooks<T>> Subscriber<T> for BaseSubscriber<T, H> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        #[cfg(debug_assertions)]
        debug_assert_first_subscribe!(self.got_subscribe);

        let previous = self.subscription.swap(Some(Arc::new(Link(subscription))));
        debug_assert!(
            previous.is_none(),
            "subscriber already holds an active subscription"
        );

        self.hooks.on_subscribe(self);
    }

    fn on_next(&self, item: T) {
        #[cfg(debug_assertions)]
        {
            debug_assert_subscribed!(self.got_subscribe);
            if self.got_terminal.load(Ordering::Relaxed) {
                tracing::trace!("on_next delivered after a terminal signal");
            }
        }

        // The guard pins the handle until the hook returns.
        let guard = self.subscription.load();
        if guard.is_some() {
            self.hooks.on_next(self, item);
        } else {
            // Cancellation racing in-flight delivery is expected, not fatal.
            tracing::trace!("dropping item delivered after termination");
        }
    }

    fn on_complete(&self) {
        #[cfg(debug_assertions)]
        {
            debug_assert_subscribed!(self.got_subscribe);
            debug_assert_first_terminal!(self.got_terminal);
        }

        if let Some(_link) = self.subscription.swap(None) {
            self.hooks.on_complete();
            self.hooks.on_terminate();
        }
    }

    fn on_error(&self, failure: Failure) {
        #[cfg(debug_assertions)]
        {
            debug_assert_subscribed!(self.got_subscribe);
            debug_assert_first_terminal!(self.got_terminal);
        }

        if let Some(_link) = self.subscription.swap(None) {
            self.hooks.on_error(failure);
            self.hooks.on_terminate();
        }
    }
}

impl<T, H: SubscriberHooks<T>> Subscription for BaseSubscriber<T, H> {
    fn request(&self, n: i64) {
        let guard = self.subscription.load();
        if let Some(link) = &*guard {
            link.0.request(n);
        } else {
            tracing::trace!(n, "request with no active subscription");
        }
    }

    fn cancel(&self) {
        if let Some(link) = self.subscription.swap(None) {
            link.0.cancel();
            self.hooks.on_terminate();
        } else {
            tracing::trace!("cancel with no active subscription");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

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

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }
    }

    impl SubscriberHooks<u64> for Recorder {
        fn on_subscribe(&self, flow: &dyn Subscription) {
            self.push("subscribe");
            flow.request(4);
        }

        fn on_next(&self, _flow: &dyn Subscription, item: u64) {
            self.push(format!("next:{item}"));
        }

        fn on_complete(&self) {
            self.push("complete");
        }

        fn on_error(&self, failure: Failure) {
            self.push(format!("error:{failure}"));
        }

        fn on_terminate(&self) {
            self.push("terminate");
        }
    }

    #[test]
    fn test_signal_flow_through_hooks() {
        let probe = Arc::new(Probe::default());
        let base = BaseSubscriber::new(Recorder::default());

        base.on_subscribe(probe.clone());
        assert!(base.is_active());
        assert_eq!(probe.requested.load(Ordering::SeqCst), 4);

        base.on_next(7);
        base.on_next(8);
        base.on_complete();
        assert!(!base.is_active());

        let events = base.hooks.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["subscribe", "next:7", "next:8", "complete", "terminate"]
        );
    }

    #[test]
    fn test_items_after_termination_are_dropped() {
        let probe = Arc::new(Probe::default());
        let base = BaseSubscriber::new(Recorder::default());

        base.on_subscribe(probe);
        base.on_complete();
        base.on_next(99); // must not reach the item hook

        let events = base.hooks.events.lock().unwrap();
        assert!(!events.iter().any(|e| e.starts_with("next")));
    }

    #[test]
    fn test_cancel_forwards_to_producer_once() {
        let probe = Arc::new(Probe::default());
        let base = BaseSubscriber::new(Recorder::default());

        base.on_subscribe(probe.clone());
        base.cancel();
        base.cancel(); // loser of the swap; must be a no-op

        assert_eq!(probe.cancels.load(Ordering::SeqCst), 1);
        let events = base.hooks.events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| *e == "terminate").count(), 1);
    }

    #[test]
    fn test_request_after_termination_is_noop() {
        let probe = Arc::new(Probe::default());
        let base = BaseSubscriber::new(Recorder::default());

        base.on_subscribe(probe.clone());
        base.cancel();
        let requested = probe.requested.load(Ordering::SeqCst);

        base.request(16);
        assert_eq!(probe.requested.load(Ordering::SeqCst), requested);
    }
}
