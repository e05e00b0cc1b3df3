// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the addsvc CLI

pub mod client;
pub mod serve;

pub use self::client::ClientCommand;
