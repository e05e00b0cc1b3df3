// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! In-memory `ToDoStore` for development and tests. Items are keyed by
//! [`TaskId`], so listing returns them in insertion order. The store can be
//! switched offline to exercise the unreachable-store paths.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::repository::{StoreError, ToDoStore};
use crate::domain::todo::{TaskId, ToDoItem};

#[derive(Clone, Default)]
pub struct InMemoryToDoStore {
    items: Arc<RwLock<BTreeMap<TaskId, ToDoItem>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryToDoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }

    fn set_status(&self, id: &str, status: bool) -> Result<String, StoreError> {
        self.check_online()?;
        let key = TaskId::parse_str(id)?;
        let mut items = self.items.write();
        let item = items
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        item.status = status;
        Ok(id.to_string())
    }
}

#[async_trait]
impl ToDoStore for InMemoryToDoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    async fn insert_todo(&self, mut item: ToDoItem) -> Result<String, StoreError> {
        self.check_online()?;
        let key = TaskId::generate();
        item.id = key.to_hex();
        let id = item.id.clone();
        self.items.write().insert(key, item);
        tracing::debug!(task_id = %id, "Inserted to-do item");
        Ok(id)
    }

    async fn complete_todo(&self, id: &str) -> Result<String, StoreError> {
        self.set_status(id, true)
    }

    async fn undo_todo(&self, id: &str) -> Result<String, StoreError> {
        self.set_status(id, false)
    }

    async fn delete_todo(&self, id: &str) -> Result<String, StoreError> {
        self.check_online()?;
        let key = TaskId::parse_str(id)?;
        self.items
            .write()
            .remove(&key)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(id.to_string())
    }

    async fn get_all_todo(&self) -> Result<Vec<ToDoItem>, StoreError> {
        self.check_online()?;
        Ok(self.items.read().values().cloned().collect())
    }
}
