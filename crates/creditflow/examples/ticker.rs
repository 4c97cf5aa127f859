use creditflow_rs::{from_fn_with_error_and_complete, Subscription};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Producer handle backed by a shared credit counter.
///
/// The producer thread drains `credit` as it delivers ticks; `request` tops
/// the counter up and `cancel` stops the stream.
#[derive(Default)]
struct TickerSubscription {
    credit: AtomicI64,
    requests: AtomicUsize,
    cancelled: AtomicBool,
}

impl Subscription for TickerSubscription {
    fn request(&self, n: i64) {
        self.credit.fetch_add(n, Ordering::SeqCst);
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

fn main() {
    println!("Creditflow Ticker Example");
    println!("=========================\n");

    const TICKS: u64 = 100_000;
    const BATCH: i64 = 64;

    println!("Configuration:");
    println!("  Ticks: {}", TICKS);
    println!("  Credit window: {}\n", BATCH);

    let subscription = Arc::new(TickerSubscription::default());
    let received = Arc::new(AtomicU64::new(0));

    let counter = received.clone();
    let subscriber = from_fn_with_error_and_complete(
        move |_tick: u64| {
            counter.fetch_add(1, Ordering::Relaxed);
        },
        |failure| eprintln!("stream failed: {}", failure),
        || println!("stream completed"),
        BATCH,
    );

    let start = Instant::now();

    // Producer thread: deliver ticks only while credit is outstanding
    let producer = {
        let subscription = Arc::clone(&subscription);
        let subscriber = Arc::clone(&subscriber);
        thread::spawn(move || {
            subscriber.on_subscribe(subscription.clone());

            let mut tick = 0u64;
            while tick < TICKS {
                if subscription.cancelled.load(Ordering::SeqCst) {
                    return;
                }
                if subscription.credit.load(Ordering::SeqCst) > 0 {
                    subscription.credit.fetch_sub(1, Ordering::SeqCst);
                    subscriber.on_next(tick);
                    tick += 1;
                } else {
                    // Wait for the consumer to replenish its window
                    thread::yield_now();
                }
            }
            subscriber.on_complete();
        })
    };

    producer.join().unwrap();
    let elapsed = start.elapsed();

    println!("\nResults:");
    println!("  Ticks received: {}", received.load(Ordering::Relaxed));
    println!(
        "  Credit requests: {}",
        subscription.requests.load(Ordering::SeqCst)
    );
    println!("  Elapsed: {:?}", elapsed);
    println!(
        "  Throughput: {:.2} M ticks/sec",
        TICKS as f64 / elapsed.as_secs_f64() / 1e6
    );
}
