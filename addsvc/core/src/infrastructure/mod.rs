// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod middleware;
pub mod repositories;
pub mod telemetry;

pub use repositories::InMemoryToDoStore;
