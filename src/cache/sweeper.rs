//! Background expiration sweep.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, warn};

/// One-shot stop flag the sweeper thread waits on.
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wakeup: Condvar,
}

/// A thread that runs a sweep on a fixed period until stopped.
///
/// Stopping is permanent. Dropping the handle stops the thread as well.
pub(crate) struct Sweeper {
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Start calling `sweep` every `interval`. It returns how many entries it
    /// removed, which is only used for logging.
    pub fn spawn<F>(interval: Duration, sweep: F) -> io::Result<Self>
    where
        F: Fn() -> usize + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name("recall-sweeper".to_string())
            .spawn(move || run(&thread_signal, interval, sweep))?;

        debug!("Expiration sweeper started, interval {:?}", interval);

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Signal the thread to stop and wait for it to exit. Calling this again
    /// is a no-op.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        *self.signal.stopped.lock() = true;
        self.signal.wakeup.notify_all();

        if handle.join().is_err() {
            warn!("Expiration sweeper panicked");
        } else {
            debug!("Expiration sweeper stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<F>(signal: &StopSignal, interval: Duration, sweep: F)
where
    F: Fn() -> usize,
{
    let mut stopped = signal.stopped.lock();

    while !*stopped {
        // An interval past the clock's range never fires; just wait for stop.
        let Some(next) = Instant::now().checked_add(interval) else {
            signal.wakeup.wait(&mut stopped);
            continue;
        };

        while !*stopped && !signal.wakeup.wait_until(&mut stopped, next).timed_out() {}
        if *stopped {
            break;
        }

        // Sweep without holding the flag so stop() is never delayed on it.
        let removed = MutexGuard::unlocked(&mut stopped, &sweep);
        if removed > 0 {
            debug!("Swept {} expired entries", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_sweeps_periodically() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let mut sweeper = Sweeper::spawn(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            0
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        sweeper.stop();

        assert!(runs.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_is_final_and_idempotent() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let mut sweeper = Sweeper::spawn(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            0
        })
        .unwrap();

        sweeper.stop();
        assert!(!sweeper.is_running());
        let after_stop = runs.load(Ordering::SeqCst);

        thread::sleep(Duration::from_millis(50));
        sweeper.stop();
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_unbounded_interval_never_sweeps() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let mut sweeper = Sweeper::spawn(Duration::MAX, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            0
        })
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        let handle = sweeper.handle.take().unwrap();
        assert!(!handle.is_finished());

        *sweeper.signal.stopped.lock() = true;
        sweeper.signal.wakeup.notify_all();
        assert!(handle.join().is_ok(), "sweeper thread panicked");
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_does_not_wait_for_interval() {
        let mut sweeper = Sweeper::spawn(Duration::from_secs(3600), || 0).unwrap();

        let started = Instant::now();
        sweeper.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
