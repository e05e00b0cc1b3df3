// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Persistence Port
//!
//! Contract the operation core calls for durable to-do state. The production
//! document store lives outside this crate; `crate::infrastructure::repositories`
//! ships an in-memory implementation for development and testing.

use async_trait::async_trait;

use crate::domain::errors::ErrorKind;
use crate::domain::todo::ToDoItem;

/// Repository interface for to-do items.
///
/// Identifiers cross this boundary as opaque strings; implementations decide
/// what a well-formed id looks like.
#[async_trait]
pub trait ToDoStore: Send + Sync {
    /// Check the backing store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert an item, returning the id assigned to it
    async fn insert_todo(&self, item: ToDoItem) -> Result<String, StoreError>;

    /// Mark an item done
    async fn complete_todo(&self, id: &str) -> Result<String, StoreError>;

    /// Mark an item not done
    async fn undo_todo(&self, id: &str) -> Result<String, StoreError>;

    async fn delete_todo(&self, id: &str) -> Result<String, StoreError>;

    async fn get_all_todo(&self) -> Result<Vec<ToDoItem>, StoreError>;
}

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("the provided hex string is not a valid ObjectID")]
    InvalidId(String),

    #[error("to-do item not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Infrastructure
    }
}
