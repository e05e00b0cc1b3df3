// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # addsvc-core
//!
//! Arithmetic and to-do operations exposed as uniform endpoints, decorated by
//! a composable middleware stack and served over JSON/HTTP.
//!
//! # Architecture
//!
//! - **Domain:** to-do items, business errors, persistence port, configuration
//! - **Application:** operation core, operation markers, endpoint wrapper
//! - **Infrastructure:** middleware layers, in-memory store, trace propagation
//! - **Presentation:** HTTP server adapter and remote-backed client set

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::{AddService, BasicService, EndpointError, EndpointSet, Reply, ServiceError};
pub use domain::config::ServiceConfig;
pub use domain::errors::{BusinessError, ErrorKind};
