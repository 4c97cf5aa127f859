use crate::base::{BaseSubscriber, SubscriberHooks};
use crate::error::{panic_description, Failure};
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;
use std::cell::UnsafeCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

// =============================================================================
// SINGLE-WRITER INVARIANTS
// =============================================================================
//
// The fields below live in `UnsafeCell` without atomics because the protocol
// gives each of them exactly one writer at a time:
//
// - `next`, `pending`: touched only on the item path. Producers serialize
//   `on_next` calls per session, and `BaseSubscriber` never dispatches the
//   item hook after termination.
// - `error`, `complete`: touched only by terminal dispatch, which runs at
//   most once per session (the termination swap picks a single winner). The
//   synthesized error dispatch on the panic path runs inside the serialized
//   item path, so it cannot overlap a producer-driven terminal signal.
//
// =============================================================================

/// Credit-window subscriber hooks built from plain callback functions.
///
/// Requests a fixed-size window of credit up front and replenishes it in
/// half-window increments as items are consumed, smoothing request traffic
/// instead of re-requesting after every item. A `batch` of
/// [`crate::credits::NO_FLOW_CONTROL`] turns the window into a single
/// unbounded request.
///
/// Built through the [`from_fn`] family of factories; pair with
/// [`BaseSubscriber`] directly only when composing custom hooks.
pub struct CallbackSubscriber<N, E, C> {
    next: UnsafeCell<N>,
    error: UnsafeCell<Option<E>>,
    complete: UnsafeCell<Option<C>>,
    /// Fixed window size, immutable after construction.
    batch: i64,
    /// Credit currently outstanding; mutated only on the item path.
    pending: UnsafeCell<i64>,
}

// Safety: every cell access follows the single-writer protocol documented in
// the module header, so sequential cross-thread use only needs the callbacks
// to be Send.
unsafe impl<N: Send, E: Send, C: Send> Send for CallbackSubscriber<N, E, C> {}
unsafe impl<N: Send, E: Send, C: Send> Sync for CallbackSubscriber<N, E, C> {}

impl<N> CallbackSubscriber<N, fn(Failure), fn()> {
    /// Hooks from a processing function alone; terminal signals are dropped.
    pub fn new(next: N, batch: i64) -> Self {
        Self::with_optional(next, None, None, batch)
    }
}

impl<N, E> CallbackSubscriber<N, E, fn()> {
    /// Hooks from processing and error-handling functions.
    pub fn with_error(next: N, error: E, batch: i64) -> Self {
        Self::with_optional(next, Some(error), None, batch)
    }
}

impl<N, E, C> CallbackSubscriber<N, E, C> {
    /// Hooks from processing, error-handling and completion functions.
    pub fn with_error_and_complete(next: N, error: E, complete: C, batch: i64) -> Self {
        Self::with_optional(next, Some(error), Some(complete), batch)
    }

    fn with_optional(next: N, error: Option<E>, complete: Option<C>, batch: i64) -> Self {
        debug_assert!(batch >= 0, "credit window must be non-negative: {batch}");
        Self {
            next: UnsafeCell::new(next),
            error: UnsafeCell::new(error),
            complete: UnsafeCell::new(complete),
            batch,
            pending: UnsafeCell::new(0),
        }
    }
}

impl<N, E, C> CallbackSubscriber<N, E, C>
where
    E: FnMut(Failure),
    C: FnMut(),
{
    fn dispatch_error(&self, failure: Failure) {
        // SAFETY: terminal dispatch runs at most once; single writer.
        let error = unsafe { &mut *self.error.get() };
        let Some(error) = error.as_mut() else { return };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| error(failure))) {
            tracing::error!(
                "error callback must not panic: {}",
                panic_description(payload.as_ref())
            );
            // Loud during development, survivable in production.
            #[cfg(debug_assertions)]
            std::panic::resume_unwind(payload);
        }
    }

    fn dispatch_complete(&self) {
        // SAFETY: terminal dispatch runs at most once; single writer.
        let complete = unsafe { &mut *self.complete.get() };
        let Some(complete) = complete.as_mut() else { return };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| complete())) {
            tracing::error!(
                "completion callback must not panic: {}",
                panic_description(payload.as_ref())
            );
            #[cfg(debug_assertions)]
            std::panic::resume_unwind(payload);
        }
    }
}

impl<T, N, E, C> SubscriberHooks<T> for CallbackSubscriber<N, E, C>
where
    N: FnMut(T) + Send,
    E: FnMut(Failure) + Send,
    C: FnMut() + Send,
{
    fn on_subscribe(&self, flow: &dyn Subscription) {
        // SAFETY: runs before any other signal can reach this session.
        unsafe { *self.pending.get() = self.batch };
        flow.request(self.batch);
    }

    fn on_next(&self, flow: &dyn Subscription, item: T) {
        // SAFETY: producers serialize on_next; item path is single-writer.
        let next = unsafe { &mut *self.next.get() };
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| next(item))) {
            // A failing processing function degrades the stream to a clean
            // error termination instead of unwinding into the producer.
            flow.cancel();
            let failure = Failure::from_panic(payload.as_ref());
            tracing::error!("item callback must not panic: {failure}");
            self.dispatch_error(failure);
            return;
        }

        // SAFETY: same serialized item path as `next` above.
        let pending = unsafe { &mut *self.pending.get() };
        *pending -= 1;
        if *pending < self.batch / 2 {
            let delta = self.batch - *pending;
            *pending += delta;
            flow.request(delta);
        }
    }

    fn on_complete(&self) {
        self.dispatch_complete();
    }

    fn on_error(&self, failure: Failure) {
        self.dispatch_error(failure);
    }
}

/// Builds a subscriber from a processing function.
///
/// `batch` is the credit window; pass [`crate::credits::NO_FLOW_CONTROL`] to
/// run without flow control. Terminal signals are dropped.
pub fn from_fn<T, N>(next: N, batch: i64) -> Arc<dyn Subscriber<T>>
where
    T: 'static,
    N: FnMut(T) + Send + 'static,
{
    Arc::new(BaseSubscriber::new(CallbackSubscriber::new(next, batch)))
}

/// Builds a subscriber from processing and error-handling functions.
///
/// A panic inside `error` itself is logged, and re-raised only in debug
/// builds.
pub fn from_fn_with_error<T, N, E>(next: N, error: E, batch: i64) -> Arc<dyn Subscriber<T>>
where
    T: 'static,
    N: FnMut(T) + Send + 'static,
    E: FnMut(Failure) + Send + 'static,
{
    Arc::new(BaseSubscriber::new(CallbackSubscriber::with_error(
        next, error, batch,
    )))
}

/// Builds a subscriber from processing, error-handling and completion
/// functions.
///
/// Panics inside `error` or `complete` follow the same containment policy as
/// [`from_fn_with_error`].
pub fn from_fn_with_error_and_complete<T, N, E, C>(
    next: N,
    error: E,
    complete: C,
    batch: i64,
) -> Arc<dyn Subscriber<T>>
where
    T: 'static,
    N: FnMut(T) + Send + 'static,
    E: FnMut(Failure) + Send + 'static,
    C: FnMut() + Send + 'static,
{
    Arc::new(BaseSubscriber::new(
        CallbackSubscriber::with_error_and_complete(next, error, complete, batch),
    ))
}
