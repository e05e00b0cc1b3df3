// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! To-do items and their document identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use crate::domain::repository::StoreError;

/// A single to-do entry.
///
/// The persistence layer owns the canonical copy; the service only holds a
/// transient copy while a request is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDoItem {
    /// Opaque identifier assigned by the store, empty until inserted.
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task: String,

    #[serde(default)]
    pub status: bool,
}

impl ToDoItem {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            task: task.into(),
            status: false,
        }
    }
}

static ID_COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

fn process_unique() -> &'static [u8; 5] {
    PROCESS_UNIQUE.get_or_init(|| {
        let random = uuid::Uuid::new_v4();
        let mut bytes = [0u8; 5];
        bytes.copy_from_slice(&random.as_bytes()[..5]);
        bytes
    })
}

/// 12-byte document identifier, rendered as 24 lower-case hex characters.
///
/// Layout: 4-byte big-endian seconds timestamp, 5 bytes unique to this
/// process, 3-byte big-endian counter. Ids generated by one process sort in
/// creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId([u8; 12]);

impl TaskId {
    pub fn generate() -> Self {
        let secs = chrono::Utc::now().timestamp() as u32;
        let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse a 24 character hex string.
    pub fn parse_str(input: &str) -> Result<Self, StoreError> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(input, &mut bytes)
            .map_err(|_| StoreError::InvalidId(input.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for TaskId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}
