// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod http;
pub mod http_client;

pub use http::{router, status_for, ErrorEnvelope, RouteError};
pub use http_client::{connect, normalize_instance, ClientError};
