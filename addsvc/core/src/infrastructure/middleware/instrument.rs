// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Request metrics recorded through the `metrics` facade.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `addsvc_request_duration_seconds` | histogram | `method`, `error` |
//! | `addsvc_requests_total` | counter | `method`, `error` |
//! | `addsvc_integers_summed_total` | counter | |
//! | `addsvc_characters_concatenated_total` | counter | |
//!
//! `error` is `"true"` when the call failed through either channel. The two
//! operation counters only move on success, by the amount the operation's
//! `measure` reports.

use futures::future::BoxFuture;
use std::marker::PhantomData;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service, ServiceExt};

use crate::application::endpoint::{EndpointError, Reply};
use crate::application::operations::{Operation, CHARACTERS_CONCATENATED, INTEGERS_SUMMED};

pub const REQUEST_DURATION: &str = "addsvc_request_duration_seconds";
pub const REQUESTS_TOTAL: &str = "addsvc_requests_total";

/// Register descriptions with the installed recorder.
pub fn describe_metrics() {
    metrics::describe_histogram!(
        REQUEST_DURATION,
        metrics::Unit::Seconds,
        "Request duration in seconds"
    );
    metrics::describe_counter!(REQUESTS_TOTAL, "Number of requests received");
    metrics::describe_counter!(INTEGERS_SUMMED, "Total count of integers summed via the Sum method");
    metrics::describe_counter!(
        CHARACTERS_CONCATENATED,
        "Total count of characters concatenated via the Concat method"
    );
}

pub struct InstrumentLayer<Op> {
    _op: PhantomData<fn() -> Op>,
}

impl<Op: Operation> InstrumentLayer<Op> {
    pub fn new() -> Self {
        Self { _op: PhantomData }
    }
}

impl<Op: Operation> Default for InstrumentLayer<Op> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Op> Clone for InstrumentLayer<Op> {
    fn clone(&self) -> Self {
        Self { _op: PhantomData }
    }
}

impl<S, Op> Layer<S> for InstrumentLayer<Op> {
    type Service = Instrumented<S, Op>;

    fn layer(&self, inner: S) -> Self::Service {
        Instrumented {
            inner,
            _op: PhantomData,
        }
    }
}

pub struct Instrumented<S, Op> {
    inner: S,
    _op: PhantomData<fn() -> Op>,
}

impl<S: Clone, Op> Clone for Instrumented<S, Op> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _op: PhantomData,
        }
    }
}

impl<S, Op> Service<Op::Request> for Instrumented<S, Op>
where
    Op: Operation,
    S: Service<Op::Request, Response = Reply<Op::Response>, Error = EndpointError>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = Reply<Op::Response>;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Op::Request) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let start = Instant::now();
            let result = inner.oneshot(request).await;
            let elapsed = start.elapsed();

            let failed = match &result {
                Ok(reply) => reply.is_failed(),
                Err(_) => true,
            };
            let labels = [
                ("method", Op::NAME),
                ("error", if failed { "true" } else { "false" }),
            ];
            metrics::histogram!(REQUEST_DURATION, &labels).record(elapsed.as_secs_f64());
            metrics::counter!(REQUESTS_TOTAL, &labels).increment(1);

            if let Ok(reply) = &result {
                if !reply.is_failed() {
                    if let Some(measure) = Op::measure(&reply.value) {
                        metrics::counter!(measure.counter).increment(measure.amount);
                    }
                }
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::operations::{
        Concat, ConcatRequest, ConcatResponse, Sum, SumRequest, SumResponse,
    };
    use crate::domain::errors::BusinessError;
    use futures::future;
    use metrics::{
        Counter, CounterFn, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder,
        SharedString, Unit,
    };
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Arc;
    use tower::service_fn;

    type Store = Arc<Mutex<HashMap<String, u64>>>;

    /// Keeps counter totals and histogram sample counts, keyed by
    /// `name{label=value,...}`.
    #[derive(Default, Clone)]
    struct Capture {
        counters: Store,
        samples: Store,
    }

    struct Handle {
        key: String,
        store: Store,
    }

    impl CounterFn for Handle {
        fn increment(&self, value: u64) {
            *self.store.lock().entry(self.key.clone()).or_default() += value;
        }

        fn absolute(&self, value: u64) {
            self.store.lock().insert(self.key.clone(), value);
        }
    }

    impl HistogramFn for Handle {
        fn record(&self, _value: f64) {
            *self.store.lock().entry(self.key.clone()).or_default() += 1;
        }
    }

    fn render(key: &Key) -> String {
        let mut labels: Vec<String> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        labels.sort();
        format!("{}{{{}}}", key.name(), labels.join(","))
    }

    impl Recorder for Capture {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            Counter::from_arc(Arc::new(Handle {
                key: render(key),
                store: self.counters.clone(),
            }))
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::from_arc(Arc::new(Handle {
                key: render(key),
                store: self.samples.clone(),
            }))
        }
    }

    impl Capture {
        fn counter(&self, key: &str) -> u64 {
            self.counters.lock().get(key).copied().unwrap_or(0)
        }

        fn samples(&self, key: &str) -> u64 {
            self.samples.lock().get(key).copied().unwrap_or(0)
        }
    }

    fn run_with<F: Future>(capture: &Capture, fut: F) -> F::Output {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        metrics::with_local_recorder(capture, || runtime.block_on(fut))
    }

    #[test]
    fn successful_sum_counts_two_integers() {
        let capture = Capture::default();
        let svc = InstrumentLayer::<Sum>::new().layer(service_fn(|req: SumRequest| {
            future::ready(Ok::<_, EndpointError>(Reply::ok(SumResponse { v: req.a + req.b })))
        }));

        run_with(&capture, async {
            svc.clone().oneshot(SumRequest { a: 1, b: 2 }).await.unwrap();
            svc.oneshot(SumRequest { a: 3, b: 4 }).await.unwrap();
        });

        assert_eq!(capture.counter("addsvc_requests_total{error=false,method=Sum}"), 2);
        assert_eq!(
            capture.samples("addsvc_request_duration_seconds{error=false,method=Sum}"),
            2
        );
        assert_eq!(capture.counter("addsvc_integers_summed_total{}"), 4);
    }

    #[test]
    fn business_failure_is_labelled_and_not_measured() {
        let capture = Capture::default();
        let svc = InstrumentLayer::<Concat>::new().layer(service_fn(|_: ConcatRequest| {
            future::ready(Ok::<_, EndpointError>(Reply::<ConcatResponse>::failed(
                BusinessError::MaxSizeExceeded,
            )))
        }));

        run_with(&capture, async {
            svc.oneshot(ConcatRequest::default()).await.unwrap();
        });

        assert_eq!(capture.counter("addsvc_requests_total{error=true,method=Concat}"), 1);
        assert_eq!(capture.counter("addsvc_characters_concatenated_total{}"), 0);
    }

    #[test]
    fn concat_counts_result_characters() {
        let capture = Capture::default();
        let svc = InstrumentLayer::<Concat>::new().layer(service_fn(|req: ConcatRequest| {
            future::ready(Ok::<_, EndpointError>(Reply::ok(ConcatResponse {
                v: format!("{}{}", req.a, req.b),
            })))
        }));

        run_with(&capture, async {
            let request = ConcatRequest {
                a: "abc".into(),
                b: "de".into(),
            };
            svc.oneshot(request).await.unwrap();
        });

        assert_eq!(capture.counter("addsvc_characters_concatenated_total{}"), 5);
    }

    #[test]
    fn endpoint_failure_is_labelled() {
        let capture = Capture::default();
        let svc = InstrumentLayer::<Sum>::new().layer(service_fn(|_: SumRequest| {
            future::ready(Err::<Reply<SumResponse>, _>(EndpointError::RateLimited))
        }));

        run_with(&capture, async {
            let _ = svc.oneshot(SumRequest::default()).await;
        });

        assert_eq!(capture.counter("addsvc_requests_total{error=true,method=Sum}"), 1);
        assert_eq!(capture.counter("addsvc_integers_summed_total{}"), 0);
    }
}
