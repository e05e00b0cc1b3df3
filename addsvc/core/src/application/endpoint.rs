// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Endpoint Wrapper
//!
//! Adapts each operation of an `AddService` into the uniform endpoint
//! contract: a `tower::Service` from the operation's request to a
//! [`Reply`], failing with an [`EndpointError`].
//!
//! Two failure channels are kept apart:
//!
//! - **Endpoint failures** (`Err(EndpointError)`): admission control,
//!   infrastructure and codec problems. Generic middleware sees these.
//! - **Business failures** (`Reply::error`): the operation core rejected the
//!   request. They are part of a successful call and reach the client intact.
//!
//! [`EndpointSet`] bundles the eight endpoints. On the server each one is a
//! wrapped `BasicService` method decorated by its own middleware chain; on the
//! client each one is a remote HTTP call (see `crate::presentation::http_client`).

use async_trait::async_trait;
use std::sync::Arc;
use tower::util::BoxCloneSyncService;
use tower::{service_fn, ServiceExt};

use crate::application::operations::*;
use crate::application::service::{AddService, ServiceError};
use crate::domain::config::EndpointConfig;
use crate::domain::errors::{BusinessError, ErrorKind};
use crate::domain::repository::StoreError;
use crate::domain::todo::ToDoItem;
use crate::infrastructure::middleware::{
    Chain, CircuitBreakerLayer, InstrumentLayer, LoggingLayer, RateLimitLayer, TraceLayer,
};

/// The uniform, type-erased endpoint for one operation.
pub type Endpoint<Op> = BoxCloneSyncService<
    <Op as Operation>::Request,
    Reply<<Op as Operation>::Response>,
    EndpointError,
>;

/// Result of a completed call: the value, plus the business error if the
/// operation core rejected the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub value: T,
    pub error: Option<BusinessError>,
}

impl<T> Reply<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_result(self) -> Result<T, ServiceError> {
        match self.error {
            Some(e) => Err(ServiceError::Business(e)),
            None => Ok(self.value),
        }
    }
}

impl<T: Default> Reply<T> {
    pub fn failed(error: BusinessError) -> Self {
        Self {
            value: T::default(),
            error: Some(error),
        }
    }
}

/// Failures of the endpoint itself, as opposed to business failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("circuit breaker is open")]
    CircuitOpen,

    /// Half-open breaker already has its trial calls in flight
    #[error("too many requests")]
    TooManyRequests,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// Error envelope returned by a remote instance
    #[error("{message}")]
    Remote { status: u16, message: String },
}

impl EndpointError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EndpointError::RateLimited
            | EndpointError::CircuitOpen
            | EndpointError::TooManyRequests => ErrorKind::Admission,
            EndpointError::Decode(_) | EndpointError::Encode(_) => ErrorKind::Codec,
            EndpointError::Store(_)
            | EndpointError::Transport(_)
            | EndpointError::Remote { .. } => ErrorKind::Infrastructure,
        }
    }
}

/// Sort an operation-core result into the two failure channels.
fn settle<T: Default>(result: Result<T, ServiceError>) -> Result<Reply<T>, EndpointError> {
    match result {
        Ok(value) => Ok(Reply::ok(value)),
        Err(ServiceError::Business(e)) => Ok(Reply::failed(e)),
        Err(ServiceError::Store(e)) => Err(EndpointError::Store(e)),
        Err(ServiceError::Endpoint(e)) => Err(e),
    }
}

pub fn make_sum_endpoint(svc: Arc<dyn AddService>) -> Endpoint<Sum> {
    BoxCloneSyncService::new(service_fn(move |req: SumRequest| {
        let svc = svc.clone();
        async move { settle(svc.sum(req.a, req.b).await.map(|v| SumResponse { v })) }
    }))
}

pub fn make_concat_endpoint(svc: Arc<dyn AddService>) -> Endpoint<Concat> {
    BoxCloneSyncService::new(service_fn(move |req: ConcatRequest| {
        let svc = svc.clone();
        async move { settle(svc.concat(&req.a, &req.b).await.map(|v| ConcatResponse { v })) }
    }))
}

pub fn make_ping_endpoint(svc: Arc<dyn AddService>) -> Endpoint<Ping> {
    BoxCloneSyncService::new(service_fn(move |_: PingRequest| {
        let svc = svc.clone();
        async move { settle(svc.ping().await.map(|v| PingResponse { v })) }
    }))
}

pub fn make_add_todo_endpoint(svc: Arc<dyn AddService>) -> Endpoint<AddToDo> {
    BoxCloneSyncService::new(service_fn(move |req: AddToDoRequest| {
        let svc = svc.clone();
        async move {
            settle(
                svc.add_todo(req.into())
                    .await
                    .map(|task_id| TaskResponse { task_id }),
            )
        }
    }))
}

pub fn make_complete_todo_endpoint(svc: Arc<dyn AddService>) -> Endpoint<CompleteToDo> {
    BoxCloneSyncService::new(service_fn(move |req: TaskRequest| {
        let svc = svc.clone();
        async move {
            settle(
                svc.complete_todo(&req.task_id)
                    .await
                    .map(|task_id| TaskResponse { task_id }),
            )
        }
    }))
}

pub fn make_undo_todo_endpoint(svc: Arc<dyn AddService>) -> Endpoint<UnDoToDo> {
    BoxCloneSyncService::new(service_fn(move |req: TaskRequest| {
        let svc = svc.clone();
        async move {
            settle(
                svc.undo_todo(&req.task_id)
                    .await
                    .map(|task_id| TaskResponse { task_id }),
            )
        }
    }))
}

pub fn make_delete_todo_endpoint(svc: Arc<dyn AddService>) -> Endpoint<DeleteToDo> {
    BoxCloneSyncService::new(service_fn(move |req: TaskRequest| {
        let svc = svc.clone();
        async move {
            settle(
                svc.delete_todo(&req.task_id)
                    .await
                    .map(|task_id| TaskResponse { task_id }),
            )
        }
    }))
}

pub fn make_get_all_todo_endpoint(svc: Arc<dyn AddService>) -> Endpoint<GetAllToDo> {
    BoxCloneSyncService::new(service_fn(move |_: GetAllToDoRequest| {
        let svc = svc.clone();
        async move { settle(svc.get_all_todo().await.map(|todos| GetAllToDoResponse { todos })) }
    }))
}

/// Server-side decoration, outer to inner:
/// tracing, logging, instrumentation, circuit breaker, rate limiter.
pub fn server_chain<Op: Operation>(config: &EndpointConfig) -> Chain<Op> {
    Chain::new()
        .with(TraceLayer::server(Op::NAME))
        .with(LoggingLayer::new(Op::NAME))
        .with(InstrumentLayer::<Op>::new())
        .with(CircuitBreakerLayer::new(Op::NAME, config.breaker(Op::NAME)))
        .with(RateLimitLayer::new(config.rate_limit(Op::NAME)))
}

/// Collects all of the endpoints that compose the service.
#[derive(Clone)]
pub struct EndpointSet {
    pub sum: Endpoint<Sum>,
    pub concat: Endpoint<Concat>,
    pub ping: Endpoint<Ping>,
    pub add_todo: Endpoint<AddToDo>,
    pub complete_todo: Endpoint<CompleteToDo>,
    pub undo_todo: Endpoint<UnDoToDo>,
    pub delete_todo: Endpoint<DeleteToDo>,
    pub get_all_todo: Endpoint<GetAllToDo>,
}

impl EndpointSet {
    /// Wrap every operation of `svc` and decorate it with its own chain.
    pub fn new(svc: Arc<dyn AddService>, config: &EndpointConfig) -> Self {
        Self {
            sum: server_chain::<Sum>(config).apply(make_sum_endpoint(svc.clone())),
            concat: server_chain::<Concat>(config).apply(make_concat_endpoint(svc.clone())),
            ping: server_chain::<Ping>(config).apply(make_ping_endpoint(svc.clone())),
            add_todo: server_chain::<AddToDo>(config).apply(make_add_todo_endpoint(svc.clone())),
            complete_todo: server_chain::<CompleteToDo>(config)
                .apply(make_complete_todo_endpoint(svc.clone())),
            undo_todo: server_chain::<UnDoToDo>(config)
                .apply(make_undo_todo_endpoint(svc.clone())),
            delete_todo: server_chain::<DeleteToDo>(config)
                .apply(make_delete_todo_endpoint(svc.clone())),
            get_all_todo: server_chain::<GetAllToDo>(config)
                .apply(make_get_all_todo_endpoint(svc)),
        }
    }

    /// Wrap every operation of `svc` without any middleware.
    pub fn undecorated(svc: Arc<dyn AddService>) -> Self {
        Self {
            sum: make_sum_endpoint(svc.clone()),
            concat: make_concat_endpoint(svc.clone()),
            ping: make_ping_endpoint(svc.clone()),
            add_todo: make_add_todo_endpoint(svc.clone()),
            complete_todo: make_complete_todo_endpoint(svc.clone()),
            undo_todo: make_undo_todo_endpoint(svc.clone()),
            delete_todo: make_delete_todo_endpoint(svc.clone()),
            get_all_todo: make_get_all_todo_endpoint(svc),
        }
    }
}

async fn invoke<Op: Operation>(
    endpoint: &Endpoint<Op>,
    request: Op::Request,
) -> Result<Op::Response, ServiceError> {
    let reply = endpoint.clone().oneshot(request).await?;
    reply.into_result()
}

// EndpointSet implements the service interface, so a set may be used as a
// service. This is primarily useful for the remote-backed client set.
#[async_trait]
impl AddService for EndpointSet {
    async fn sum(&self, a: i64, b: i64) -> Result<i64, ServiceError> {
        invoke::<Sum>(&self.sum, SumRequest { a, b }).await.map(|r| r.v)
    }

    async fn concat(&self, a: &str, b: &str) -> Result<String, ServiceError> {
        let request = ConcatRequest {
            a: a.to_string(),
            b: b.to_string(),
        };
        invoke::<Concat>(&self.concat, request).await.map(|r| r.v)
    }

    async fn ping(&self) -> Result<String, ServiceError> {
        invoke::<Ping>(&self.ping, PingRequest {}).await.map(|r| r.v)
    }

    async fn add_todo(&self, item: ToDoItem) -> Result<String, ServiceError> {
        let request = AddToDoRequest {
            task: item.task,
            status: item.status,
        };
        invoke::<AddToDo>(&self.add_todo, request)
            .await
            .map(|r| r.task_id)
    }

    async fn complete_todo(&self, task_id: &str) -> Result<String, ServiceError> {
        invoke::<CompleteToDo>(&self.complete_todo, TaskRequest::new(task_id))
            .await
            .map(|r| r.task_id)
    }

    async fn undo_todo(&self, task_id: &str) -> Result<String, ServiceError> {
        invoke::<UnDoToDo>(&self.undo_todo, TaskRequest::new(task_id))
            .await
            .map(|r| r.task_id)
    }

    async fn delete_todo(&self, task_id: &str) -> Result<String, ServiceError> {
        invoke::<DeleteToDo>(&self.delete_todo, TaskRequest::new(task_id))
            .await
            .map(|r| r.task_id)
    }

    async fn get_all_todo(&self) -> Result<Vec<ToDoItem>, ServiceError> {
        invoke::<GetAllToDo>(&self.get_all_todo, GetAllToDoRequest {})
            .await
            .map(|r| r.todos)
    }
}
