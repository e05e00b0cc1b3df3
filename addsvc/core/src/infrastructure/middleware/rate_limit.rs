// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Token-bucket admission control.
//!
//! The limiter never waits: when the bucket is empty the call fails at once
//! with `EndpointError::RateLimited` and the inner endpoint is not invoked.
//! A limiter can be private to one operation or shared by several (the
//! client endpoint set shares one across every remote operation).

use futures::future::{self, BoxFuture};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service, ServiceExt};

use crate::application::endpoint::EndpointError;
use crate::domain::config::RateLimitConfig;

/// Build a direct limiter refilling `rate_per_second` tokens with `burst` capacity.
pub fn limiter_for(config: RateLimitConfig) -> DefaultDirectRateLimiter {
    let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);
    let period = if config.rate_per_second.is_finite() && config.rate_per_second > 0.0 {
        Duration::from_secs_f64(1.0 / config.rate_per_second)
    } else {
        Duration::from_secs(1)
    };

    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);
    RateLimiter::direct(quota)
}

#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl RateLimitLayer {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::shared(Arc::new(limiter_for(config)))
    }

    /// Reuse an existing limiter, so several endpoints draw from one bucket.
    pub fn shared(limiter: Arc<DefaultDirectRateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimit<S> {
    inner: S,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<S, Request> Service<Request> for RateLimit<S>
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
        if self.limiter.check().is_err() {
            return Box::pin(future::ready(Err(EndpointError::RateLimited)));
        }
        Box::pin(self.inner.clone().oneshot(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::service_fn;

    fn counting_service(
        calls: Arc<AtomicUsize>,
    ) -> impl Service<u32, Response = u32, Error = EndpointError, Future = impl Send> + Clone + Send
    {
        service_fn(move |n: u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok::<_, EndpointError>(n))
        })
    }

    #[tokio::test]
    async fn second_back_to_back_call_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = RateLimitLayer::new(RateLimitConfig::new(1.0, 1))
            .layer(counting_service(calls.clone()));

        assert_eq!(svc.clone().oneshot(1).await, Ok(1));
        assert_eq!(svc.clone().oneshot(2).await, Err(EndpointError::RateLimited));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bucket_refills_after_the_period() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = RateLimitLayer::new(RateLimitConfig::new(1.0, 1))
            .layer(counting_service(calls.clone()));

        assert!(svc.clone().oneshot(1).await.is_ok());
        tokio::time::sleep(Duration::from_millis(1050)).await;
        assert!(svc.clone().oneshot(2).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn burst_allows_that_many_immediate_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = RateLimitLayer::new(RateLimitConfig::new(1.0, 3))
            .layer(counting_service(calls.clone()));

        for n in 0..3 {
            assert!(svc.clone().oneshot(n).await.is_ok());
        }
        assert_eq!(svc.clone().oneshot(9).await, Err(EndpointError::RateLimited));
    }

    #[tokio::test]
    async fn shared_limiter_spans_endpoints() {
        let limiter = Arc::new(limiter_for(RateLimitConfig::new(1.0, 1)));
        let calls = Arc::new(AtomicUsize::new(0));
        let first = RateLimitLayer::shared(limiter.clone()).layer(counting_service(calls.clone()));
        let second = RateLimitLayer::shared(limiter).layer(counting_service(calls.clone()));

        assert!(first.oneshot(1).await.is_ok());
        assert_eq!(second.oneshot(2).await, Err(EndpointError::RateLimited));
    }
}
