// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Operations
//!
//! One zero-sized marker per operation. The `Operation` trait ties together
//! the name used for spans, logs and metrics, the HTTP route, and the typed
//! request/response pair. Everything generic in the endpoint pipeline and the
//! transports is parameterised by these markers, so there is no downcasting.
//!
//! | Marker | Method | Path | Request | Response |
//! |--------|--------|------|---------|----------|
//! | `Sum` | POST | `/sum` | `{A, B}` | `{v}` |
//! | `Concat` | POST | `/concat` | `{A, B}` | `{v}` |
//! | `Ping` | GET | `/ping` | `{}` | `{v}` |
//! | `AddToDo` | POST | `/addToDo` | `{task, status}` | `{taskID}` |
//! | `CompleteToDo` | PUT | `/completeToDo` | `{taskID}` | `{taskID}` |
//! | `UnDoToDo` | PUT | `/unDoToDo` | `{taskID}` | `{taskID}` |
//! | `DeleteToDo` | DELETE | `/deleteToDo` | `{taskID}` | `{taskID}` |
//! | `GetAllToDo` | GET | `/getAllToDo` | `{}` | `{todos}` |

use axum::http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::todo::ToDoItem;

pub const INTEGERS_SUMMED: &str = "addsvc_integers_summed_total";
pub const CHARACTERS_CONCATENATED: &str = "addsvc_characters_concatenated_total";

/// Counter increment reported by an operation for one successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure {
    pub counter: &'static str,
    pub amount: u64,
}

pub trait Operation: Send + Sync + 'static {
    /// Name used for spans, log lines and metric labels
    const NAME: &'static str;
    const METHOD: Method;
    const PATH: &'static str;

    type Request: Serialize + DeserializeOwned + fmt::Debug + Clone + Send + Sync + 'static;
    type Response: Serialize
        + DeserializeOwned
        + fmt::Debug
        + Clone
        + Default
        + Send
        + Sync
        + 'static;

    /// Quantitative counter for a successful response, if the operation has one.
    fn measure(_response: &Self::Response) -> Option<Measure> {
        None
    }
}

/// Absent fields decode as zero values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SumRequest {
    #[serde(rename = "A", alias = "a")]
    pub a: i64,
    #[serde(rename = "B", alias = "b")]
    pub b: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumResponse {
    pub v: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcatRequest {
    #[serde(rename = "A", alias = "a")]
    pub a: String,
    #[serde(rename = "B", alias = "b")]
    pub b: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatResponse {
    pub v: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub v: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToDoRequest {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub status: bool,
}

impl From<AddToDoRequest> for ToDoItem {
    fn from(req: AddToDoRequest) -> Self {
        ToDoItem {
            id: String::new(),
            task: req.task,
            status: req.status,
        }
    }
}

/// Request body shared by the operations addressing a single item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRequest {
    #[serde(rename = "taskID")]
    pub task_id: String,
}

impl TaskRequest {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }
}

/// Response body shared by the operations returning a single item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(rename = "taskID")]
    pub task_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllToDoRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllToDoResponse {
    #[serde(default)]
    pub todos: Vec<ToDoItem>,
}

#[derive(Debug, Clone, Copy)]
pub struct Sum;

impl Operation for Sum {
    const NAME: &'static str = "Sum";
    const METHOD: Method = Method::POST;
    const PATH: &'static str = "/sum";
    type Request = SumRequest;
    type Response = SumResponse;

    fn measure(_response: &SumResponse) -> Option<Measure> {
        Some(Measure {
            counter: INTEGERS_SUMMED,
            amount: 2,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Concat;

impl Operation for Concat {
    const NAME: &'static str = "Concat";
    const METHOD: Method = Method::POST;
    const PATH: &'static str = "/concat";
    type Request = ConcatRequest;
    type Response = ConcatResponse;

    fn measure(response: &ConcatResponse) -> Option<Measure> {
        Some(Measure {
            counter: CHARACTERS_CONCATENATED,
            amount: response.v.len() as u64,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ping;

impl Operation for Ping {
    const NAME: &'static str = "Ping";
    const METHOD: Method = Method::GET;
    const PATH: &'static str = "/ping";
    type Request = PingRequest;
    type Response = PingResponse;
}

#[derive(Debug, Clone, Copy)]
pub struct AddToDo;

impl Operation for AddToDo {
    const NAME: &'static str = "AddToDo";
    const METHOD: Method = Method::POST;
    const PATH: &'static str = "/addToDo";
    type Request = AddToDoRequest;
    type Response = TaskResponse;
}

#[derive(Debug, Clone, Copy)]
pub struct CompleteToDo;

impl Operation for CompleteToDo {
    const NAME: &'static str = "CompleteToDo";
    const METHOD: Method = Method::PUT;
    const PATH: &'static str = "/completeToDo";
    type Request = TaskRequest;
    type Response = TaskResponse;
}

#[derive(Debug, Clone, Copy)]
pub struct UnDoToDo;

impl Operation for UnDoToDo {
    const NAME: &'static str = "UnDoToDo";
    const METHOD: Method = Method::PUT;
    const PATH: &'static str = "/unDoToDo";
    type Request = TaskRequest;
    type Response = TaskResponse;
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteToDo;

impl Operation for DeleteToDo {
    const NAME: &'static str = "DeleteToDo";
    const METHOD: Method = Method::DELETE;
    const PATH: &'static str = "/deleteToDo";
    type Request = TaskRequest;
    type Response = TaskResponse;
}

#[derive(Debug, Clone, Copy)]
pub struct GetAllToDo;

impl Operation for GetAllToDo {
    const NAME: &'static str = "GetAllToDo";
    const METHOD: Method = Method::GET;
    const PATH: &'static str = "/getAllToDo";
    type Request = GetAllToDoRequest;
    type Response = GetAllToDoResponse;
}
