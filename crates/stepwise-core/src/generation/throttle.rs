//! Spacing of upstream generation calls.
//!
//! [`Throttle`] is a single-token bucket: one call may pass, after which the
//! bucket refills once `interval` has elapsed. The admission decision,
//! [`Throttle::try_acquire`], takes the current instant as an argument so it
//! can be exercised without sleeping.

use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use log::debug;
use tokio::time::Instant;

use super::client::{GenerationError, GenerationRequest, GeneratedStep, StepGenerator};

#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    next_token_at: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_token_at: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take the token at `now`, or report how long until it refills.
    pub fn try_acquire(&self, now: Instant) -> Result<(), Duration> {
        let mut next = self
            .next_token_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match *next {
            Some(at) if now < at => Err(at - now),
            _ => {
                *next = Some(now + self.interval);
                Ok(())
            }
        }
    }

    /// Wait until the token is available and take it.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire(Instant::now()) {
                Ok(()) => return,
                Err(wait) => {
                    debug!("Throttling generation call for {}ms", wait.as_millis());
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// A generator whose calls pass through a [`Throttle`] first.
pub struct ThrottledGenerator<G> {
    inner: G,
    throttle: Throttle,
}

impl<G> ThrottledGenerator<G> {
    pub fn new(inner: G, throttle: Throttle) -> Self {
        Self { inner, throttle }
    }
}

#[async_trait]
impl<G: StepGenerator> StepGenerator for ThrottledGenerator<G> {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedStep>, GenerationError> {
        self.throttle.acquire().await;
        self.inner.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_passes_immediately() {
        let throttle = Throttle::new(Duration::from_millis(500));
        assert_eq!(throttle.try_acquire(Instant::now()), Ok(()));
    }

    #[test]
    fn test_second_call_waits_for_refill() {
        let throttle = Throttle::new(Duration::from_millis(500));
        let start = Instant::now();

        assert!(throttle.try_acquire(start).is_ok());
        assert_eq!(
            throttle.try_acquire(start + Duration::from_millis(200)),
            Err(Duration::from_millis(300))
        );
        assert!(throttle
            .try_acquire(start + Duration::from_millis(500))
            .is_ok());
    }

    #[test]
    fn test_refused_call_does_not_consume_token() {
        let throttle = Throttle::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(throttle.try_acquire(start).is_ok());
        assert!(throttle.try_acquire(start).is_err());
        assert!(throttle
            .try_acquire(start + Duration::from_millis(100))
            .is_ok());
        assert_eq!(
            throttle.try_acquire(start + Duration::from_millis(150)),
            Err(Duration::from_millis(50))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_spaces_calls() {
        let throttle = Throttle::new(Duration::from_millis(500));
        let start = Instant::now();

        throttle.acquire().await;
        throttle.acquire().await;
        throttle.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
