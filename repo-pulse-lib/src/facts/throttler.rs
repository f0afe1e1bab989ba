use core::time::Duration;
use ohno::IntoAppError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Bounds concurrent requests to the hosting API and holds them back while a rate limit is in force.
///
/// Call [`Throttler::acquire`] before each request and keep the permit until the response
/// has been consumed. When a request reports a rate limit, [`Throttler::pause_for`] records a
/// resume deadline; every later `acquire` sleeps until it has passed. Overlapping pauses keep
/// the latest deadline.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,
    resume_at: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Minimum extension required for a new pause to replace an active one, so that
    /// concurrent requests reporting the same reset time do not each restart the pause.
    const MIN_PAUSE_EXTENSION: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            resume_at: Mutex::new(None),
        }
    }

    fn deadline(&self) -> MutexGuard<'_, Option<Instant>> {
        self.resume_at.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait out any active pause, then acquire a concurrency slot.
    pub async fn acquire(&self) -> crate::Result<OwnedSemaphorePermit> {
        // re-check after each sleep: the pause may have been extended meanwhile
        loop {
            let resume_at = *self.deadline();
            match resume_at {
                Some(at) if at > Instant::now() => tokio::time::sleep_until(at).await,
                _ => break,
            }
        }

        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .into_app_err("request throttler closed")
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.deadline().is_some_and(|at| at > Instant::now())
    }

    /// Hold back new requests for `duration`.
    ///
    /// Requests already in flight are not interrupted. Returns `false` when an equivalent
    /// or longer pause is already active.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let now = Instant::now();
        let new_resume_at = now + duration;

        let mut deadline = self.deadline();
        if deadline.is_some_and(|existing| existing > now && existing + Self::MIN_PAUSE_EXTENSION >= new_resume_at) {
            return false;
        }

        *deadline = Some(new_resume_at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_limits_concurrency() {
        let throttler = Arc::new(Throttler::new(2));
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let throttler = Arc::clone(&throttler);
                let active = Arc::clone(&active);
                let max_seen = Arc::clone(&max_seen);
                tokio::spawn(async move {
                    let _permit = throttler.acquire().await.unwrap();
                    let current = active.fetch_add(1, Ordering::SeqCst) + 1;
                    _ = max_seen.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    _ = active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        _ = futures_util::future::join_all(tasks).await;

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_pause_blocks_new_requests() {
        let throttler = Throttler::new(5);
        assert!(throttler.pause_for(Duration::from_millis(200)));
        assert!(throttler.is_paused());

        let start = Instant::now();
        let _permit = throttler.acquire().await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(!throttler.is_paused());
    }

    #[tokio::test]
    async fn test_shorter_pause_is_ignored() {
        let throttler = Throttler::new(1);
        assert!(throttler.pause_for(Duration::from_secs(10)));
        assert!(!throttler.pause_for(Duration::from_secs(2)));
        assert!(throttler.pause_for(Duration::from_secs(20)));
    }

    #[tokio::test]
    async fn test_expired_pause_can_be_replaced() {
        let throttler = Throttler::new(1);
        assert!(throttler.pause_for(Duration::ZERO));
        assert!(!throttler.is_paused());
        assert!(throttler.pause_for(Duration::from_millis(1)));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_admits_one() {
        let throttler = Throttler::new(0);
        let _permit = throttler.acquire().await.unwrap();
    }
}
