// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One OpenTelemetry span per call.
//!
//! The span is a child of whatever context is current when the call starts
//! (the HTTP adapter makes the propagated W3C context current), and the inner
//! endpoint runs with the new span as its current context so a remote call
//! made further in injects it into the outgoing headers.

use futures::future::BoxFuture;
use opentelemetry::global;
use opentelemetry::trace::{FutureExt as _, SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context as OtelContext, KeyValue};
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

use crate::application::endpoint::{EndpointError, Reply};

pub const TRACER_NAME: &str = "addsvc";

#[derive(Debug, Clone, Copy)]
pub struct TraceLayer {
    name: &'static str,
    kind: Kind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Server,
    Client,
}

impl TraceLayer {
    /// Spans for calls served by this process.
    pub fn server(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Server,
        }
    }

    /// Spans for calls made to a remote instance.
    pub fn client(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Client,
        }
    }
}

impl<S> Layer<S> for TraceLayer {
    type Service = Traced<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Traced {
            inner,
            name: self.name,
            kind: self.kind,
        }
    }
}

#[derive(Clone)]
pub struct Traced<S> {
    inner: S,
    name: &'static str,
    kind: Kind,
}

impl<S, Request, T> Service<Request> for Traced<S>
where
    S: Service<Request, Response = Reply<T>, Error = EndpointError> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Request: Send + 'static,
    T: Send + 'static,
{
    type Response = Reply<T>;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let inner = self.inner.clone();
        let name = self.name;
        let kind = match self.kind {
            Kind::Server => SpanKind::Server,
            Kind::Client => SpanKind::Client,
        };
        let parent = OtelContext::current();

        Box::pin(async move {
            let tracer = global::tracer(TRACER_NAME);
            let span = tracer
                .span_builder(name)
                .with_kind(kind)
                .with_attributes([KeyValue::new("operation", name)])
                .start_with_context(&tracer, &parent);
            let cx = parent.with_span(span);

            let result = inner.oneshot(request).with_context(cx.clone()).await;

            let span = cx.span();
            match &result {
                Ok(reply) => match &reply.error {
                    Some(err) => {
                        span.add_event(
                            "business error",
                            vec![KeyValue::new("error", err.to_string())],
                        );
                        span.set_status(Status::error(err.to_string()));
                    }
                    None => span.set_status(Status::Ok),
                },
                Err(e) => {
                    span.record_error(e);
                    span.set_status(Status::error(e.to_string()));
                }
            }
            span.end();

            result
        })
    }
}
