use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::publisher::PublishError;

// ============================================================================
// Broker Circuit Breaker
// ============================================================================
//
// Keeps an unreachable broker from stalling business requests. After
// `failure_threshold` consecutive transport failures the breaker opens and
// publishes are dropped immediately; once `cooldown` has elapsed a single
// trial publish is let through (half-open). Events are never re-sent.
//
// The state lock is never held across an await, so it is a plain mutex and
// can be released from `Drop` when a trial publish is cancelled.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    /// Gauge encoding: 0 = closed, 1 = open, 2 = half-open.
    pub fn as_gauge(&self) -> i64 {
        match self {
            BreakerState::Closed => 0,
            BreakerState::Open => 1,
            BreakerState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

#[derive(Clone)]
pub struct BrokerBreaker {
    inner: Arc<Mutex<Inner>>,
    config: BreakerConfig,
}

/// One admitted publish. A trial that is dropped before it settles reopens
/// the breaker, so a cancelled request cannot leave the trial slot taken.
struct Admission<'a> {
    breaker: &'a BrokerBreaker,
    trial: bool,
    settled: bool,
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            self.breaker.abandon_trial();
        }
    }
}

impl BrokerBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            })),
            config,
        }
    }

    /// Runs `publish` unless the breaker is open.
    pub async fn call<F, T>(&self, publish: F) -> Result<T, PublishError>
    where
        F: std::future::Future<Output = Result<T, PublishError>>,
    {
        let mut admission = self.admit()?;
        let result = publish.await;
        admission.settled = true;

        match result {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(err)
            }
        }
    }

    pub async fn state(&self) -> BreakerState {
        self.lock().state
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner holds plain values, a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn admit(&self) -> Result<Admission<'_>, PublishError> {
        let mut inner = self.lock();

        let trial = match inner.state {
            BreakerState::Closed => false,
            BreakerState::HalfOpen if inner.trial_in_flight => return Err(PublishError::CircuitOpen),
            BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let cooled = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.cooldown)
                    .unwrap_or(true);

                if !cooled {
                    return Err(PublishError::CircuitOpen);
                }

                tracing::info!("Broker breaker half-open, letting one publish through");
                inner.state = BreakerState::HalfOpen;
                true
            }
        };

        if trial {
            inner.trial_in_flight = true;
        }

        Ok(Admission {
            breaker: self,
            trial,
            settled: false,
        })
    }

    fn on_success(&self) {
        let mut inner = self.lock();

        if inner.state != BreakerState::Closed {
            tracing::info!("Broker breaker closed after successful publish");
        }
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;
    }

    fn on_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        inner.trial_in_flight = false;

        let should_open = match inner.state {
            BreakerState::HalfOpen => true,
            BreakerState::Closed => inner.consecutive_failures >= self.config.failure_threshold,
            BreakerState::Open => false,
        };

        if should_open {
            tracing::warn!(
                consecutive_failures = inner.consecutive_failures,
                cooldown_secs = self.config.cooldown.as_secs(),
                "Broker breaker opened"
            );
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    fn abandon_trial(&self) {
        let mut inner = self.lock();
        if inner.state != BreakerState::HalfOpen || !inner.trial_in_flight {
            return;
        }

        tracing::warn!("Broker breaker trial publish was cancelled, reopening");
        inner.trial_in_flight = false;
        inner.state = BreakerState::Open;
        inner.opened_at = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, cooldown: Duration) -> BrokerBreaker {
        BrokerBreaker::new(BreakerConfig {
            failure_threshold: threshold,
            cooldown,
        })
    }

    async fn fail(b: &BrokerBreaker) -> Result<(), PublishError> {
        b.call(async { Err::<(), _>(PublishError::Transport("connection refused".into())) })
            .await
    }

    #[tokio::test]
    async fn test_opens_after_consecutive_failures() {
        let b = breaker(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(matches!(fail(&b).await, Err(PublishError::Transport(_))));
        }
        assert_eq!(b.state().await, BreakerState::Open);

        let result = b.call(async { Ok::<_, PublishError>(()) }).await;
        assert!(matches!(result, Err(PublishError::CircuitOpen)));
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let b = breaker(2, Duration::from_secs(60));

        let _ = fail(&b).await;
        b.call(async { Ok::<_, PublishError>(()) }).await.unwrap();
        let _ = fail(&b).await;

        assert_eq!(b.state().await, BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_trial_closes_on_success() {
        let b = breaker(1, Duration::from_millis(50));

        let _ = fail(&b).await;
        assert_eq!(b.state().await, BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(80)).await;

        b.call(async { Ok::<_, PublishError>(()) }).await.unwrap();
        assert_eq!(b.state().await, BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_trial_failure_reopens() {
        let b = breaker(1, Duration::from_millis(50));

        let _ = fail(&b).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        let _ = fail(&b).await;

        assert_eq!(b.state().await, BreakerState::Open);
    }

    #[tokio::test]
    async fn test_cancelled_trial_does_not_wedge_breaker() {
        let b = breaker(1, Duration::from_millis(20));

        let _ = fail(&b).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            b.call(std::future::pending::<Result<(), PublishError>>()),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(b.state().await, BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(40)).await;
        b.call(async { Ok::<_, PublishError>(()) }).await.unwrap();
        assert_eq!(b.state().await, BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_cancelled_call_while_closed_changes_nothing() {
        let b = breaker(1, Duration::from_secs(60));

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            b.call(std::future::pending::<Result<(), PublishError>>()),
        )
        .await;

        assert!(cancelled.is_err());
        assert_eq!(b.state().await, BreakerState::Closed);
        b.call(async { Ok::<_, PublishError>(()) }).await.unwrap();
    }

    #[test]
    fn test_gauge_encoding() {
        assert_eq!(BreakerState::Closed.as_gauge(), 0);
        assert_eq!(BreakerState::Open.as_gauge(), 1);
        assert_eq!(BreakerState::HalfOpen.as_gauge(), 2);
    }
}
