// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Circuit Breaker
//!
//! Three-state gate in front of an endpoint.
//!
//! - **Closed**: calls pass. Consecutive endpoint failures are counted; once
//!   they reach `failure_threshold` the breaker opens. With a non-zero
//!   `interval` the counts are cleared periodically while closed.
//! - **Open**: calls fail immediately with `CircuitOpen` until `timeout`
//!   elapses, then the breaker goes half-open.
//! - **Half-open**: at most `max_half_open_requests` trial calls are admitted
//!   (others get `TooManyRequests`). That many consecutive successes close the
//!   breaker; any failure opens it again.
//!
//! Only `Err` results count as failures. A reply carrying a business error is
//! a successful call as far as the breaker is concerned.
//!
//! Every state change bumps a generation counter; results of calls admitted
//! under an older generation are ignored. A call dropped before it completes
//! gives its admission back without counting as a success or a failure.

use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::time::Instant;
use tower::{Layer, Service, ServiceExt};

use crate::application::endpoint::EndpointError;
use crate::domain::config::BreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    HalfOpen,
    Open,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BreakerState::Closed => "closed",
            BreakerState::HalfOpen => "half-open",
            BreakerState::Open => "open",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    requests: u32,
    consecutive_successes: u32,
    consecutive_failures: u32,
}

impl Counts {
    fn on_success(&mut self) {
        self.consecutive_successes += 1;
        self.consecutive_failures = 0;
    }

    fn on_failure(&mut self) {
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
    }
}

struct Inner {
    state: BreakerState,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
}

pub struct CircuitBreaker {
    name: &'static str,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: BreakerConfig) -> Self {
        let breaker = Self {
            name,
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry: None,
            }),
        };
        {
            let mut inner = breaker.inner.lock();
            breaker.new_generation(&mut inner, Instant::now());
        }
        breaker
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> BreakerState {
        let mut inner = self.inner.lock();
        self.current_state(&mut inner, Instant::now()).0
    }

    /// Admit a call, returning the generation it was admitted under.
    pub fn before_request(&self) -> Result<u64, EndpointError> {
        let mut inner = self.inner.lock();
        let (state, generation) = self.current_state(&mut inner, Instant::now());

        match state {
            BreakerState::Open => Err(EndpointError::CircuitOpen),
            BreakerState::HalfOpen if inner.counts.requests >= self.half_open_limit() => {
                Err(EndpointError::TooManyRequests)
            }
            _ => {
                inner.counts.requests += 1;
                Ok(generation)
            }
        }
    }

    /// Record the outcome of a call admitted under `generation`.
    pub fn after_request(&self, generation: u64, success: bool) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let (state, current) = self.current_state(&mut inner, now);
        if current != generation {
            return;
        }

        if success {
            inner.counts.on_success();
            if state == BreakerState::HalfOpen
                && inner.counts.consecutive_successes >= self.half_open_limit()
            {
                self.set_state(&mut inner, BreakerState::Closed, now);
            }
        } else {
            inner.counts.on_failure();
            match state {
                BreakerState::Closed
                    if inner.counts.consecutive_failures >= self.config.failure_threshold =>
                {
                    self.set_state(&mut inner, BreakerState::Open, now);
                }
                BreakerState::HalfOpen => self.set_state(&mut inner, BreakerState::Open, now),
                _ => {}
            }
        }
    }

    /// Give back the admission of a call under `generation` that never completed.
    pub fn release(&self, generation: u64) {
        let mut inner = self.inner.lock();
        let (_, current) = self.current_state(&mut inner, Instant::now());
        if current == generation {
            inner.counts.requests = inner.counts.requests.saturating_sub(1);
        }
    }

    fn half_open_limit(&self) -> u32 {
        self.config.max_half_open_requests.max(1)
    }

    fn current_state(&self, inner: &mut Inner, now: Instant) -> (BreakerState, u64) {
        let expired = inner.expiry.is_some_and(|expiry| expiry <= now);
        match inner.state {
            BreakerState::Closed if expired => self.new_generation(inner, now),
            BreakerState::Open if expired => self.set_state(inner, BreakerState::HalfOpen, now),
            _ => {}
        }
        (inner.state, inner.generation)
    }

    fn set_state(&self, inner: &mut Inner, state: BreakerState, now: Instant) {
        if inner.state == state {
            return;
        }
        let from = inner.state;
        inner.state = state;
        self.new_generation(inner, now);

        if state == BreakerState::Open {
            tracing::warn!(breaker = self.name, %from, to = %state, "Circuit breaker state changed");
        } else {
            tracing::info!(breaker = self.name, %from, to = %state, "Circuit breaker state changed");
        }
    }

    fn new_generation(&self, inner: &mut Inner, now: Instant) {
        inner.generation += 1;
        inner.counts = Counts::default();
        inner.expiry = match inner.state {
            BreakerState::Closed if self.config.interval.is_zero() => None,
            BreakerState::Closed => Some(now + self.config.interval),
            BreakerState::Open => Some(now + self.config.timeout),
            BreakerState::HalfOpen => None,
        };
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.inner.lock().state)
            .finish()
    }
}

/// An admitted call. Dropping it unsettled releases the admission.
struct Admission {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    settled: bool,
}

impl Admission {
    fn settle(mut self, success: bool) {
        self.settled = true;
        self.breaker.after_request(self.generation, success);
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreakerLayer {
    breaker: Arc<CircuitBreaker>,
}

impl CircuitBreakerLayer {
    pub fn new(name: &'static str, config: BreakerConfig) -> Self {
        Self {
            breaker: Arc::new(CircuitBreaker::new(name, config)),
        }
    }

    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        self.breaker.clone()
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreakerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CircuitBreakerService {
            inner,
            breaker: self.breaker.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreakerService<S> {
    inner: S,
    breaker: Arc<CircuitBreaker>,
}

impl<S, Request> Service<Request> for CircuitBreakerService<S>
where
    S: Service<Request, Error = EndpointError> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let generation = match self.breaker.before_request() {
            Ok(generation) => generation,
            Err(e) => return Box::pin(future::ready(Err(e))),
        };

        let admission = Admission {
            breaker: self.breaker.clone(),
            generation,
            settled: false,
        };
        let inner = self.inner.clone();
        Box::pin(async move {
            let result = inner.oneshot(request).await;
            admission.settle(result.is_ok());
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::service_fn;

    #[derive(Clone, Default)]
    struct Backend {
        failing: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    impl Backend {
        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn guarded(
        backend: &Backend,
        config: BreakerConfig,
    ) -> (
        Arc<CircuitBreaker>,
        impl Service<(), Response = (), Error = EndpointError, Future = impl Send> + Clone,
    ) {
        let layer = CircuitBreakerLayer::new("test", config);
        let backend = backend.clone();
        let svc = layer.layer(service_fn(move |_: ()| {
            backend.calls.fetch_add(1, Ordering::SeqCst);
            let result = if backend.failing.load(Ordering::SeqCst) {
                Err(EndpointError::Transport("connection refused".into()))
            } else {
                Ok(())
            };
            future::ready(result)
        }));
        (layer.breaker(), svc)
    }

    fn config(threshold: u32) -> BreakerConfig {
        BreakerConfig::default()
            .with_failure_threshold(threshold)
            .with_timeout(Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_consecutive_failures() {
        let backend = Backend::default();
        backend.fail(true);
        let (breaker, svc) = guarded(&backend, config(3));

        for _ in 0..3 {
            assert!(matches!(
                svc.clone().oneshot(()).await,
                Err(EndpointError::Transport(_))
            ));
        }
        assert_eq!(breaker.state(), BreakerState::Open);
        assert_eq!(svc.clone().oneshot(()).await, Err(EndpointError::CircuitOpen));
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn a_success_resets_the_failure_streak() {
        let backend = Backend::default();
        let (breaker, svc) = guarded(&backend, config(3));

        backend.fail(true);
        let _ = svc.clone().oneshot(()).await;
        let _ = svc.clone().oneshot(()).await;
        backend.fail(false);
        assert!(svc.clone().oneshot(()).await.is_ok());
        backend.fail(true);
        let _ = svc.clone().oneshot(()).await;
        let _ = svc.clone().oneshot(()).await;

        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_success_closes_the_breaker() {
        let backend = Backend::default();
        backend.fail(true);
        let (breaker, svc) = guarded(&backend, config(1));

        let _ = svc.clone().oneshot(()).await;
        assert_eq!(breaker.state(), BreakerState::Open);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(breaker.state(), BreakerState::Open);
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        backend.fail(false);
        assert!(svc.clone().oneshot(()).await.is_ok());
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens_the_breaker() {
        let backend = Backend::default();
        backend.fail(true);
        let (breaker, svc) = guarded(&backend, config(1));

        let _ = svc.clone().oneshot(()).await;
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        let _ = svc.clone().oneshot(()).await;
        assert_eq!(breaker.state(), BreakerState::Open);
        assert_eq!(svc.clone().oneshot(()).await, Err(EndpointError::CircuitOpen));
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_admits_a_limited_number_of_trials() {
        let breaker = CircuitBreaker::new("trial", config(1));
        let generation = breaker.before_request().unwrap();
        breaker.after_request(generation, false);

        tokio::time::advance(Duration::from_secs(31)).await;
        let trial = breaker.before_request().unwrap();
        assert_eq!(breaker.before_request(), Err(EndpointError::TooManyRequests));

        breaker.after_request(trial, true);
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.before_request().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_trial_gives_back_its_half_open_slot() {
        let hang = Arc::new(AtomicBool::new(true));
        let layer = CircuitBreakerLayer::new("cancel", config(1));
        let breaker = layer.breaker();
        let svc = layer.layer(service_fn({
            let hang = hang.clone();
            move |_: ()| {
                let hang = hang.load(Ordering::SeqCst);
                async move {
                    if hang {
                        future::pending::<()>().await;
                    }
                    Ok::<_, EndpointError>(())
                }
            }
        }));

        let generation = breaker.before_request().unwrap();
        breaker.after_request(generation, false);
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        let trial = tokio::time::timeout(Duration::from_millis(10), svc.clone().oneshot(())).await;
        assert!(trial.is_err());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        hang.store(false, Ordering::SeqCst);
        assert!(svc.clone().oneshot(()).await.is_ok());
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn release_does_not_touch_the_failure_streak() {
        let breaker = CircuitBreaker::new("release", config(2));
        let failed = breaker.before_request().unwrap();
        breaker.after_request(failed, false);
        let dropped = breaker.before_request().unwrap();
        breaker.release(dropped);
        assert_eq!(breaker.state(), BreakerState::Closed);

        let failed = breaker.before_request().unwrap();
        breaker.after_request(failed, false);
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clears_closed_counts() {
        let backend = Backend::default();
        backend.fail(true);
        let mut cfg = config(3);
        cfg.interval = Duration::from_secs(10);
        let (breaker, svc) = guarded(&backend, cfg);

        let _ = svc.clone().oneshot(()).await;
        let _ = svc.clone().oneshot(()).await;
        tokio::time::advance(Duration::from_secs(11)).await;
        let _ = svc.clone().oneshot(()).await;
        let _ = svc.clone().oneshot(()).await;

        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_results_are_ignored() {
        let breaker = CircuitBreaker::new("stale", config(1));
        let first = breaker.before_request().unwrap();
        let second = breaker.before_request().unwrap();

        breaker.after_request(first, false);
        assert_eq!(breaker.state(), BreakerState::Open);
        tokio::time::advance(Duration::from_secs(31)).await;

        // Admitted while closed; must not close the half-open breaker.
        breaker.after_request(second, true);
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
    }
}
