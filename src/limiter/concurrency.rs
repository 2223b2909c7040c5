use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

use super::Verdict;

/// Admits up to `limit` concurrent tasks; everything beyond that is shed.
///
/// `submit` never blocks: a task is either spawned immediately with a slot
/// held for its lifetime, or rejected. `wait` completes once every accepted
/// task has returned.
pub struct ConcurrencyLimiter {
    limit: u32,
    semaphore: Arc<Semaphore>,
    stopped: AtomicBool,
}

impl ConcurrencyLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1) as u32;
        Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit as usize)),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn start(&self) {
        self.stopped.store(false, Ordering::Release);
    }

    /// Stop admitting new tasks, then wait for in-flight ones. Idempotent.
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.wait().await;
    }

    /// Block until all accepted tasks have completed.
    pub async fn wait(&self) {
        // Holding every slot at once means nothing is in flight.
        // The semaphore is never closed, so this cannot fail.
        if let Ok(all) = self.semaphore.acquire_many(self.limit).await {
            drop(all);
        }
    }

    /// Try to admit a task. On acceptance the task runs on its own
    /// execution context and its slot is released when it returns.
    pub fn submit<F>(&self, task: F) -> Verdict
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.stopped.load(Ordering::Acquire) {
            return Verdict::Rejected;
        }

        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => {
                tokio::spawn(async move {
                    task.await;
                    drop(permit);
                });
                Verdict::Accepted
            }
            Err(_) => Verdict::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_limit_clamped_to_one() {
        let limiter = ConcurrencyLimiter::new(0);
        assert_eq!(limiter.limit, 1);
    }

    #[tokio::test]
    async fn test_submit_past_limit_rejected() {
        let limiter = ConcurrencyLimiter::new(2);

        let (release1, gate1) = oneshot::channel::<()>();
        let (release2, gate2) = oneshot::channel::<()>();

        assert_eq!(
            limiter.submit(async move {
                let _ = gate1.await;
            }),
            Verdict::Accepted
        );
        assert_eq!(
            limiter.submit(async move {
                let _ = gate2.await;
            }),
            Verdict::Accepted
        );
        // Both slots occupied by blocked tasks.
        assert_eq!(limiter.submit(async {}), Verdict::Rejected);

        release1.send(()).unwrap();
        release2.send(()).unwrap();
        limiter.wait().await;

        // Slots free again.
        assert_eq!(limiter.submit(async {}), Verdict::Accepted);
    }

    #[tokio::test]
    async fn test_never_more_than_limit_in_flight() {
        let limiter = Arc::new(ConcurrencyLimiter::new(3));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut accepted = 0;
        for _ in 0..50 {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            let verdict = limiter.submit(async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
            if verdict == Verdict::Accepted {
                accepted += 1;
            }
            tokio::task::yield_now().await;
        }

        limiter.wait().await;
        assert!(accepted >= 3);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_wait_returns_after_tasks_finish() {
        let limiter = ConcurrencyLimiter::new(2);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let done = done.clone();
            limiter.submit(async move {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        limiter.wait().await;
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stopped_limiter_rejects() {
        let limiter = ConcurrencyLimiter::new(4);
        limiter.stop().await;
        assert_eq!(limiter.submit(async {}), Verdict::Rejected);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let limiter = ConcurrencyLimiter::new(4);
        limiter.stop().await;
        assert_eq!(limiter.submit(async {}), Verdict::Rejected);

        limiter.start();
        assert_eq!(limiter.submit(async {}), Verdict::Accepted);
        limiter.wait().await;
    }
}
