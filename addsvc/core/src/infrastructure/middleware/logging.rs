// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One structured log event per completed call: method, request, output,
//! error and elapsed milliseconds.

use futures::future::BoxFuture;
use std::fmt;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service, ServiceExt};

use crate::application::endpoint::{EndpointError, Reply};

#[derive(Debug, Clone, Copy)]
pub struct LoggingLayer {
    method: &'static str,
}

impl LoggingLayer {
    pub fn new(method: &'static str) -> Self {
        Self { method }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logged<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logged {
            inner,
            method: self.method,
        }
    }
}

#[derive(Clone)]
pub struct Logged<S> {
    inner: S,
    method: &'static str,
}

impl<S, Request, T> Service<Request> for Logged<S>
where
    S: Service<Request, Response = Reply<T>, Error = EndpointError> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Request: fmt::Debug + Send + 'static,
    T: fmt::Debug + Send + 'static,
{
    type Response = Reply<T>;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let inner = self.inner.clone();
        let method = self.method;

        Box::pin(async move {
            let input = format!("{request:?}");
            let start = Instant::now();
            let result = inner.oneshot(request).await;
            let took_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(Reply { value, error: None }) => {
                    tracing::info!(method, request = %input, output = ?value, took_ms, "call completed");
                }
                Ok(Reply {
                    value,
                    error: Some(err),
                }) => {
                    tracing::warn!(method, request = %input, output = ?value, error = %err, took_ms, "call rejected");
                }
                Err(err) => {
                    tracing::warn!(method, request = %input, error = %err, took_ms, "call failed");
                }
            }

            result
        })
    }
}
