//! Subscriber-side core for credit-based push streams
//!
//! This crate provides the consumer half of a push-based stream protocol with
//! backpressure: a [`Subscriber`] receives a stream handle, requests a bounded
//! window of credit, consumes items, and reaches exactly one terminal outcome,
//! while remaining safe under concurrent signaling and cancellation from
//! arbitrary threads.
//!
//! # Features
//!
//! - **Lock-free termination**: a single atomic exchange of the stream handle
//!   decides which of `on_complete` / `on_error` / `cancel` wins; losers are
//!   silent no-ops
//! - **Credit windows**: callback subscribers request a fixed window up front
//!   and replenish it in half-window increments as items are consumed
//! - **Panic containment**: a panicking processing function degrades the
//!   stream to a clean error termination instead of unwinding into the
//!   producer
//! - **Debug-build protocol checks**: signal-ordering violations assert in
//!   debug builds and cost nothing in release
//!
//! # Example
//!
//! ```ignore
//! use creditflow_rs::{from_fn_with_error, Subscriber};
//!
//! let subscriber = from_fn_with_error(
//!     |item: u64| println!("got {item}"),
//!     |failure| eprintln!("stream failed: {failure}"),
//!     64, // credit window
//! );
//!
//! // The producer side drives the subscriber:
//! // subscriber.on_subscribe(subscription);
//! // subscriber.on_next(1);
//! // subscriber.on_complete();
//! ```

mod base;
mod callback;
pub mod credits;
mod error;
#[cfg(debug_assertions)]
mod invariants;
mod subscriber;
mod subscription;

pub use base::{BaseSubscriber, SubscriberHooks};
pub use callback::{
    from_fn, from_fn_with_error, from_fn_with_error_and_complete, CallbackSubscriber,
};
pub use error::Failure;
pub use subscriber::{discard, Subscriber};
pub use subscription::Subscription;
