// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Error Taxonomy
//!
//! Every failure in the service falls into one of four kinds:
//!
//! | Kind | Examples | Origin |
//! |------|----------|--------|
//! | `Business` | two zeroes, integer overflow, oversized concat | operation core |
//! | `Infrastructure` | store unreachable, malformed identifier | persistence port, remote calls |
//! | `Admission` | rate limited, circuit open | middleware stack |
//! | `Codec` | malformed request or response bodies | transport adapter |
//!
//! The transport maps a kind (never an error instance) to a status code, so
//! new business errors only need a variant here.

use serde::{Deserialize, Serialize};

/// Coarse classification used for status-code mapping and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Business,
    Infrastructure,
    Admission,
    Codec,
}

/// Deterministic, caller-correctable validation failures produced by the
/// operation core. They travel inside a `Reply` rather than failing the
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusinessError {
    #[error("can't sum two zeroes")]
    TwoZeroes,

    #[error("integer overflow")]
    IntOverflow,

    #[error("result exceeds maximum size")]
    MaxSizeExceeded,
}

impl BusinessError {
    pub const ALL: [BusinessError; 3] = [
        BusinessError::TwoZeroes,
        BusinessError::IntOverflow,
        BusinessError::MaxSizeExceeded,
    ];

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Business
    }

    /// Recover a business error from its wire message.
    pub fn from_message(message: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.to_string() == message)
    }
}
