// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # HTTP Server Adapter
//!
//! One route per operation. The request body is decoded into the operation's
//! request type (an empty body counts as `{}`), the endpoint is invoked with
//! the caller's propagated trace context, and the outcome is encoded:
//!
//! - success: `200` with the response as JSON
//! - business error: `400` with `{"error": message}`
//! - any other failure: `500` with `{"error": message}`

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use axum::Router;
use opentelemetry::trace::FutureExt as _;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;

use crate::application::endpoint::{Endpoint, EndpointError, EndpointSet, Reply};
use crate::application::operations::*;
use crate::domain::errors::ErrorKind;
use crate::infrastructure::telemetry::extract_context;

/// Body of every non-200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// An operation declares a method no route filter exists for.
#[derive(Debug, thiserror::Error)]
#[error("cannot route {operation}: unsupported method {method}")]
pub struct RouteError {
    pub operation: &'static str,
    pub method: Method,
}

/// Status code for a failure of the given kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Business => StatusCode::BAD_REQUEST,
        ErrorKind::Infrastructure | ErrorKind::Admission | ErrorKind::Codec => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Mount every endpoint of the set on its route.
pub fn router(endpoints: EndpointSet) -> Result<Router, RouteError> {
    Ok(Router::new()
        .merge(route::<Sum>(endpoints.sum)?)
        .merge(route::<Concat>(endpoints.concat)?)
        .merge(route::<Ping>(endpoints.ping)?)
        .merge(route::<AddToDo>(endpoints.add_todo)?)
        .merge(route::<CompleteToDo>(endpoints.complete_todo)?)
        .merge(route::<UnDoToDo>(endpoints.undo_todo)?)
        .merge(route::<DeleteToDo>(endpoints.delete_todo)?)
        .merge(route::<GetAllToDo>(endpoints.get_all_todo)?))
}

fn route<Op: Operation>(endpoint: Endpoint<Op>) -> Result<Router, RouteError> {
    let filter = method_filter(Op::NAME, Op::METHOD)?;
    Ok(Router::new()
        .route(Op::PATH, on(filter, serve::<Op>))
        .with_state(endpoint))
}

fn method_filter(operation: &'static str, method: Method) -> Result<MethodFilter, RouteError> {
    MethodFilter::try_from(method.clone()).map_err(|_| RouteError { operation, method })
}

async fn serve<Op: Operation>(
    State(endpoint): State<Endpoint<Op>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match decode_request::<Op>(&body) {
        Ok(request) => request,
        Err(e) => return endpoint_failure::<Op>(e),
    };

    let parent = extract_context(&headers);
    match endpoint.oneshot(request).with_context(parent).await {
        Ok(Reply { value, error: None }) => match serde_json::to_vec(&value) {
            Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => endpoint_failure::<Op>(EndpointError::Encode(e.to_string())),
        },
        Ok(Reply {
            error: Some(err), ..
        }) => error_response(status_for(err.kind()), err.to_string()),
        Err(e) => endpoint_failure::<Op>(e),
    }
}

fn decode_request<Op: Operation>(body: &[u8]) -> Result<Op::Request, EndpointError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| EndpointError::Decode(e.to_string()))
}

fn endpoint_failure<Op: Operation>(err: EndpointError) -> Response {
    tracing::warn!(operation = Op::NAME, kind = ?err.kind(), error = %err, "Request failed");
    error_response(status_for(err.kind()), err.to_string())
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, axum::Json(ErrorEnvelope { error })).into_response()
}
