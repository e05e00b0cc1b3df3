// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Application Layer
//!
//! - [`service`]: operation core (`AddService`, `BasicService`)
//! - [`operations`]: per-operation markers and request/response types
//! - [`endpoint`]: the uniform endpoint contract and the `EndpointSet`

pub mod endpoint;
pub mod operations;
pub mod service;

pub use endpoint::{Endpoint, EndpointError, EndpointSet, Reply};
pub use service::{AddService, BasicService, ServiceError};
