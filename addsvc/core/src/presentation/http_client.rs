// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # HTTP Client Adapter
//!
//! Builds an [`EndpointSet`] whose endpoints call a remote instance. Each
//! remote endpoint is wrapped, outer to inner, by its own circuit breaker,
//! a rate limiter shared by the whole set, and a client span.
//!
//! Responses are decoded by status: `200` yields the typed response, a `400`
//! carrying a known business message yields that business error in the
//! reply, and anything else fails the endpoint with `EndpointError::Remote`.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use governor::DefaultDirectRateLimiter;
use opentelemetry::Context as OtelContext;
use std::sync::Arc;
use tower::service_fn;
use tower::util::BoxCloneSyncService;
use url::Url;

use crate::application::endpoint::{Endpoint, EndpointError, EndpointSet, Reply};
use crate::application::operations::*;
use crate::domain::config::ClientConfig;
use crate::domain::errors::BusinessError;
use crate::infrastructure::middleware::rate_limit::limiter_for;
use crate::infrastructure::middleware::{
    Chain, CircuitBreakerLayer, RateLimitLayer, TraceLayer,
};
use crate::infrastructure::telemetry::inject_context;
use crate::presentation::http::ErrorEnvelope;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid instance {instance:?}: {source}")]
    InvalidInstance {
        instance: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Accept `host:port` as well as a full URL; a missing scheme means `http`.
pub fn normalize_instance(instance: &str) -> Result<Url, ClientError> {
    let instance = instance.trim();
    let raw = if instance.starts_with("http") {
        instance.to_string()
    } else {
        format!("http://{instance}")
    };
    Url::parse(&raw).map_err(|source| ClientError::InvalidInstance {
        instance: instance.to_string(),
        source,
    })
}

fn route_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.set_path(path);
    url
}

/// Endpoint that performs `Op` against the instance at `base`.
pub fn remote_endpoint<Op: Operation>(client: reqwest::Client, base: &Url) -> Endpoint<Op> {
    let url = route_url(base, Op::PATH);
    BoxCloneSyncService::new(service_fn(move |request: Op::Request| {
        let client = client.clone();
        let url = url.clone();
        async move { call_remote::<Op>(&client, url, request).await }
    }))
}

async fn call_remote<Op: Operation>(
    client: &reqwest::Client,
    url: Url,
    request: Op::Request,
) -> Result<Reply<Op::Response>, EndpointError> {
    let body = serde_json::to_vec(&request).map_err(|e| EndpointError::Encode(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    inject_context(&OtelContext::current(), &mut headers);

    let response = client
        .request(Op::METHOD, url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| EndpointError::Transport(e.to_string()))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| EndpointError::Transport(e.to_string()))?;

    if status == StatusCode::OK {
        let value =
            serde_json::from_slice(&bytes).map_err(|e| EndpointError::Decode(e.to_string()))?;
        return Ok(Reply::ok(value));
    }

    let message = match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
        Ok(envelope) => envelope.error,
        Err(_) => String::from_utf8_lossy(&bytes).trim().to_string(),
    };
    if status == StatusCode::BAD_REQUEST {
        if let Some(err) = BusinessError::from_message(&message) {
            return Ok(Reply::failed(err));
        }
    }
    Err(EndpointError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// Client-side decoration, outer to inner: circuit breaker, shared rate
/// limiter, tracing.
pub fn client_chain<Op: Operation>(
    config: &ClientConfig,
    limiter: &Arc<DefaultDirectRateLimiter>,
) -> Chain<Op> {
    Chain::new()
        .with(CircuitBreakerLayer::new(Op::NAME, config.breaker(Op::NAME)))
        .with(RateLimitLayer::shared(limiter.clone()))
        .with(TraceLayer::client(Op::NAME))
}

/// Build an endpoint set backed by the instance named in `config`.
pub fn connect(config: &ClientConfig) -> Result<EndpointSet, ClientError> {
    let base = normalize_instance(&config.instance)?;
    let client = reqwest::Client::builder().build()?;
    let limiter = Arc::new(limiter_for(config.rate_limit));

    fn remote<Op: Operation>(
        config: &ClientConfig,
        limiter: &Arc<DefaultDirectRateLimiter>,
        client: &reqwest::Client,
        base: &Url,
    ) -> Endpoint<Op> {
        client_chain::<Op>(config, limiter).apply(remote_endpoint::<Op>(client.clone(), base))
    }

    tracing::debug!(instance = %base, "Connecting endpoint set to remote instance");
    Ok(EndpointSet {
        sum: remote::<Sum>(config, &limiter, &client, &base),
        concat: remote::<Concat>(config, &limiter, &client, &base),
        ping: remote::<Ping>(config, &limiter, &client, &base),
        add_todo: remote::<AddToDo>(config, &limiter, &client, &base),
        complete_todo: remote::<CompleteToDo>(config, &limiter, &client, &base),
        undo_todo: remote::<UnDoToDo>(config, &limiter, &client, &base),
        delete_todo: remote::<DeleteToDo>(config, &limiter, &client, &base),
        get_all_todo: remote::<GetAllToDo>(config, &limiter, &client, &base),
    })
}
