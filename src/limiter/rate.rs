use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Verdict;

/// Capacity-1 token bucket. One token is available immediately; a background
/// cadence produces one more every `1/rate` seconds while started.
///
/// A stopped limiter admits immediately, degrading to unlimited. Callers that
/// need to cancel `wait` drop the future.
pub struct RateLimiter {
    period: Duration,
    bucket: Arc<Semaphore>,
    state: Mutex<RefillState>,
}

struct RefillState {
    stopped: bool,
    stop_tx: watch::Sender<bool>,
    refill: Option<JoinHandle<()>>,
}

impl RateLimiter {
    pub fn new(rate: usize) -> Self {
        let rate = rate.max(1);
        let (stop_tx, _) = watch::channel(false);
        Self {
            period: Duration::from_secs_f64(1.0 / rate as f64),
            bucket: Arc::new(Semaphore::new(1)),
            state: Mutex::new(RefillState {
                stopped: true,
                stop_tx,
                refill: None,
            }),
        }
    }

    /// Launch the refill cadence. A no-op when already started.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if !state.stopped {
            return;
        }
        state.stopped = false;

        let (stop_tx, stop_rx) = watch::channel(false);
        state.stop_tx = stop_tx;
        state.refill = Some(tokio::spawn(refill_loop(
            self.bucket.clone(),
            self.period,
            stop_rx,
        )));
    }

    /// Terminate the cadence and release any waiter. Idempotent.
    pub async fn stop(&self) {
        let refill = {
            let mut state = self.state.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
            let _ = state.stop_tx.send(true);
            state.refill.take()
        };
        if let Some(task) = refill {
            let _ = task.await;
        }
    }

    /// Block until a token is available or the limiter stops. A stopped
    /// limiter returns immediately.
    pub async fn wait(&self) {
        let mut stop_rx = {
            let state = self.state.lock();
            if state.stopped {
                return;
            }
            state.stop_tx.subscribe()
        };

        tokio::select! {
            permit = self.bucket.acquire() => {
                // Consume the token; the refill task produces the next one.
                if let Ok(permit) = permit {
                    permit.forget();
                }
            }
            _ = stop_rx.changed() => {}
        }
    }

    /// Wait for a token, then run the task in place.
    pub async fn submit<F>(&self, task: F) -> Verdict
    where
        F: Future<Output = ()> + Send,
    {
        self.wait().await;
        task.await;
        Verdict::Accepted
    }
}

async fn refill_loop(bucket: Arc<Semaphore>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    let start = tokio::time::Instant::now() + period;
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Capacity 1: a token that is already present is not topped up.
                if bucket.available_permits() == 0 {
                    bucket.add_permits(1);
                }
            }
            _ = stop_rx.changed() => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_first_submission_is_immediate() {
        let limiter = RateLimiter::new(1);
        limiter.start();

        let begin = Instant::now();
        limiter.submit(async {}).await;
        assert!(begin.elapsed() < Duration::from_millis(100));

        limiter.stop().await;
    }

    #[tokio::test]
    async fn test_submissions_are_paced() {
        // rate 10 => one token per 100ms, burst of 1.
        let limiter = RateLimiter::new(10);
        limiter.start();

        let begin = Instant::now();
        for _ in 0..3 {
            limiter.submit(async {}).await;
        }
        let elapsed = begin.elapsed();

        // Three submissions consume the initial token plus two refills:
        // at least ~2 periods, with slack for timer jitter.
        assert!(
            elapsed >= Duration::from_millis(150),
            "3 submissions at rate 10 finished in {elapsed:?}"
        );

        limiter.stop().await;
    }

    #[tokio::test]
    async fn test_average_spacing_at_least_period() {
        let limiter = RateLimiter::new(20);
        limiter.start();

        let submissions = 5;
        let begin = Instant::now();
        for _ in 0..submissions {
            limiter.submit(async {}).await;
        }
        let elapsed = begin.elapsed();

        // Burst of 1 allowed, so (submissions - 1) refills are needed.
        let min_expected = limiter.period * (submissions - 1) / 2;
        assert!(
            elapsed >= min_expected,
            "average spacing below 1/rate: {elapsed:?}"
        );

        limiter.stop().await;
    }

    #[tokio::test]
    async fn test_stopped_limiter_admits_immediately() {
        let limiter = RateLimiter::new(1);
        // Never started: degrades to unlimited.
        let begin = Instant::now();
        for _ in 0..5 {
            limiter.submit(async {}).await;
        }
        assert!(begin.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_stop_releases_waiter() {
        let limiter = Arc::new(RateLimiter::new(1));
        limiter.start();

        // Drain the initial token.
        limiter.wait().await;

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        limiter.stop().await;

        // The waiter must resolve rather than hang.
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter did not resolve after stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_restart_rearms_cadence() {
        let limiter = RateLimiter::new(10);
        limiter.start();
        limiter.submit(async {}).await;
        limiter.stop().await;

        limiter.start();
        let begin = Instant::now();
        limiter.submit(async {}).await;
        limiter.submit(async {}).await;
        // Second submission after restart still needs a refill.
        assert!(begin.elapsed() >= Duration::from_millis(50));
        limiter.stop().await;
    }
}
