// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Middleware Stack
//!
//! Each decorator is a `tower::Layer` whose service keeps the endpoint
//! contract, so decorators stack in any order. [`Middleware`] is the
//! object-safe view of such a layer for a single operation, and [`Chain`] is
//! an explicit ordered list of them folded around an endpoint at
//! construction time.
//!
//! | Layer | Concern | Fails with |
//! |-------|---------|------------|
//! | [`TraceLayer`] | OpenTelemetry span per call | never |
//! | [`LoggingLayer`] | one `tracing` event per call | never |
//! | [`InstrumentLayer`] | duration histogram, request and operation counters | never |
//! | [`CircuitBreakerLayer`] | closed / open / half-open gate | `CircuitOpen`, `TooManyRequests` |
//! | [`RateLimitLayer`] | non-blocking token bucket | `RateLimited` |
//!
//! ```ignore
//! let sum = Chain::<Sum>::new()
//!     .with(TraceLayer::server("Sum"))
//!     .with(RateLimitLayer::new(RateLimitConfig::new(1.0, 1)))
//!     .apply(make_sum_endpoint(svc));
//! ```

pub mod circuit_breaker;
pub mod instrument;
pub mod logging;
pub mod rate_limit;
pub mod trace;

pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerLayer};
pub use instrument::InstrumentLayer;
pub use logging::LoggingLayer;
pub use rate_limit::RateLimitLayer;
pub use trace::TraceLayer;

use std::fmt;
use std::sync::Arc;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

use crate::application::endpoint::{Endpoint, EndpointError, Reply};
use crate::application::operations::Operation;

/// Transforms one endpoint into another, adding one cross-cutting behaviour.
pub trait Middleware<Op: Operation>: Send + Sync {
    fn wrap(&self, inner: Endpoint<Op>) -> Endpoint<Op>;
}

impl<Op, L> Middleware<Op> for L
where
    Op: Operation,
    L: Layer<Endpoint<Op>> + Send + Sync,
    L::Service: Service<Op::Request, Response = Reply<Op::Response>, Error = EndpointError>
        + Clone
        + Send
        + Sync
        + 'static,
    <L::Service as Service<Op::Request>>::Future: Send + 'static,
{
    fn wrap(&self, inner: Endpoint<Op>) -> Endpoint<Op> {
        BoxCloneSyncService::new(self.layer(inner))
    }
}

/// Ordered list of middlewares, outermost first.
pub struct Chain<Op: Operation> {
    middlewares: Vec<Arc<dyn Middleware<Op>>>,
}

impl<Op: Operation> Chain<Op> {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Append a middleware inside the ones already in the chain.
    pub fn with(mut self, middleware: impl Middleware<Op> + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Decorate `endpoint`; the first middleware added ends up outermost.
    pub fn apply(&self, endpoint: Endpoint<Op>) -> Endpoint<Op> {
        self.middlewares
            .iter()
            .rev()
            .fold(endpoint, |inner, middleware| middleware.wrap(inner))
    }
}

impl<Op: Operation> Default for Chain<Op> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Op: Operation> Clone for Chain<Op> {
    fn clone(&self) -> Self {
        Self {
            middlewares: self.middlewares.clone(),
        }
    }
}

impl<Op: Operation> fmt::Debug for Chain<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("operation", &Op::NAME)
            .field("len", &self.middlewares.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::operations::{Ping, PingRequest, PingResponse};
    use parking_lot::Mutex;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tower::{service_fn, ServiceExt};

    /// Records its label on the way in, to observe nesting order.
    #[derive(Clone)]
    struct Tag {
        label: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    #[derive(Clone)]
    struct Tagged<S> {
        tag: Tag,
        inner: S,
    }

    impl<S> Layer<S> for Tag {
        type Service = Tagged<S>;

        fn layer(&self, inner: S) -> Self::Service {
            Tagged {
                tag: self.clone(),
                inner,
            }
        }
    }

    impl<S> Service<PingRequest> for Tagged<S>
    where
        S: Service<PingRequest, Response = Reply<PingResponse>, Error = EndpointError>
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        type Response = Reply<PingResponse>;
        type Error = EndpointError;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: PingRequest) -> Self::Future {
            self.tag.seen.lock().push(self.tag.label);
            let inner = self.inner.clone();
            Box::pin(inner.oneshot(request))
        }
    }

    #[tokio::test]
    async fn chain_applies_first_middleware_outermost() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tag = |label| Tag {
            label,
            seen: seen.clone(),
        };

        let chain = Chain::<Ping>::new()
            .with(tag("outer"))
            .with(tag("middle"))
            .with(tag("inner"));
        assert_eq!(chain.len(), 3);

        let endpoint: Endpoint<Ping> = BoxCloneSyncService::new(service_fn({
            let seen = seen.clone();
            move |_: PingRequest| {
                seen.lock().push("operation");
                async { Ok::<_, EndpointError>(Reply::ok(PingResponse { v: "up".into() })) }
            }
        }));

        let reply = chain.apply(endpoint).oneshot(PingRequest {}).await.unwrap();
        assert_eq!(reply.value.v, "up");
        assert_eq!(*seen.lock(), vec!["outer", "middle", "inner", "operation"]);
    }

    #[tokio::test]
    async fn empty_chain_returns_the_endpoint_unchanged() {
        let chain = Chain::<Ping>::default();
        assert!(chain.is_empty());
        let endpoint: Endpoint<Ping> = BoxCloneSyncService::new(service_fn(|_: PingRequest| async {
            Ok::<_, EndpointError>(Reply::ok(PingResponse { v: "down".into() }))
        }));
        let reply = chain.apply(endpoint).oneshot(PingRequest {}).await.unwrap();
        assert_eq!(reply.value.v, "down");
    }
}
