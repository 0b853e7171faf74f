//! Recall demo - console walkthrough of the memoizing cache.
//!
//! ## Steps
//!
//! - Memoize a slow point-product function and show hits, misses and expiry
//! - Show argument-count and argument-type errors and how they classify
//! - Fan out concurrent callers on one key (misses are not coalesced)

mod config;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use recall::{Callable, Memo, args, is_call_error, is_recall_error};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Debug)]
struct Point {
    x: i64,
    y: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, show cache decisions at debug level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recall=debug,recall_demo=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: {}",
        serde_json::to_string(&config.cache).context("serializing cache config")?
    );

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let products = Memo::<i64>::create_with(
        Callable::new(move |p: Box<Point>| {
            counter.fetch_add(1, Ordering::SeqCst);
            info!("Computing product of {:?}", p);
            thread::sleep(Duration::from_millis(200));
            p.x * p.y
        }),
        config.cache.clone(),
    )?;

    walkthrough(&products)?;
    errors(&products)?;
    fan_out(&products, config.workers).await?;

    products.unload();
    info!(
        "Done: wrapped function ran {} times, {:?}",
        calls.load(Ordering::SeqCst),
        products
    );

    Ok(())
}

/// Hits, misses and expiry on a single cache.
fn walkthrough(products: &Memo<i64>) -> anyhow::Result<()> {
    let value = timed("first value", || products.get(args![Box::new(Point { x: 1, y: 2 })]))?;
    info!("OK! {}", value);

    let value = timed("new value, not cached", || {
        products.get(args![Box::new(Point { x: 1, y: 3 })])
    })?;
    info!("OK! {}", value);

    let value = timed("first value again, cached", || {
        products.get(args![Box::new(Point { x: 1, y: 2 })])
    })?;
    info!("OK! {}", value);

    let expiry = products.expires_in(&args![Box::new(Point { x: 1, y: 2 })]);
    info!("Expires in {}ms", expiry.num_milliseconds());
    if expiry <= chrono::TimeDelta::zero() {
        bail!("cached entry should not have expired yet");
    }

    match expiry.to_std() {
        Ok(wait) if wait < Duration::from_secs(60) => {
            info!("Sleeping until the entry expires");
            thread::sleep(wait + Duration::from_millis(10));

            let value = timed("first value after expiry", || {
                products.get(args![Box::new(Point { x: 1, y: 2 })])
            })?;
            info!("OK! {}", value);
        }
        _ => warn!("Lifetime too long for the demo, skipping expiry step"),
    }

    Ok(())
}

/// Calls the cache rejects before reaching the wrapped function.
fn errors(products: &Memo<i64>) -> anyhow::Result<()> {
    match products.get(args![1i64, 2i64]) {
        Err(err) => info!("OK! {}", err),
        Ok(value) => bail!("expected an argument count error, got {}", value),
    }

    match products.get(args![1i64]) {
        Err(err) => {
            info!("OK! {}", err);
            info!("Is a call error? {}", is_call_error(&err));
            info!("Is a recall error? {}", is_recall_error(&err));
        }
        Ok(value) => bail!("expected an argument type error, got {}", value),
    }

    Ok(())
}

/// Concurrent first-time callers for the same key each run the function.
async fn fan_out(products: &Memo<i64>, workers: usize) -> anyhow::Result<()> {
    products.invalidate_all();

    let tasks = (0..workers).map(|_| {
        let products = products.clone();
        tokio::task::spawn_blocking(move || products.get(args![Box::new(Point { x: 7, y: 6 })]))
    });

    for result in futures::future::join_all(tasks).await {
        let value = result.context("worker panicked")??;
        info!("Worker got {}", value);
    }

    info!("{} concurrent callers left {} entry", workers, products.entry_count());
    Ok(())
}

fn timed<T>(label: &str, f: impl FnOnce() -> Result<T, recall::Error>) -> anyhow::Result<T> {
    let start = Instant::now();
    let value = f()?;
    info!("{} took {:?}", label, start.elapsed());
    Ok(value)
}
