// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer (`addsvc-core`)
//!
//! Plain data and contracts shared by every other layer. Nothing in here
//! knows about HTTP, middleware or the async runtime.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`todo`] | `ToDoItem` and the `TaskId` document identifier |
//! | [`errors`] | Business errors and the `ErrorKind` classification |
//! | [`repository`] | `ToDoStore` persistence port and `StoreError` |
//! | [`config`] | `ServiceConfig` and the rate-limit / breaker settings |

pub mod config;
pub mod errors;
pub mod repository;
pub mod todo;
