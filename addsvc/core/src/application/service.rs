// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Operation Core
//!
//! Business rules for every operation, with no transport or cross-cutting
//! concerns. `BasicService` talks to the persistence port; everything else
//! (decoration, encoding, error mapping) happens around it.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::endpoint::EndpointError;
use crate::domain::errors::{BusinessError, ErrorKind};
use crate::domain::repository::{StoreError, ToDoStore};
use crate::domain::todo::ToDoItem;

/// Largest combined length accepted by `concat`, in characters.
pub const MAX_CONCAT_LEN: usize = 10;

/// The operation surface. Implemented by `BasicService` on the server and by
/// `EndpointSet`, which lets a decorated or remote-backed set stand in for
/// the service itself.
#[async_trait]
pub trait AddService: Send + Sync {
    async fn sum(&self, a: i64, b: i64) -> Result<i64, ServiceError>;
    async fn concat(&self, a: &str, b: &str) -> Result<String, ServiceError>;
    /// Health probe of the backing store; `"up"` or `"down"`.
    async fn ping(&self) -> Result<String, ServiceError>;
    async fn add_todo(&self, item: ToDoItem) -> Result<String, ServiceError>;
    async fn complete_todo(&self, task_id: &str) -> Result<String, ServiceError>;
    async fn undo_todo(&self, task_id: &str) -> Result<String, ServiceError>;
    async fn delete_todo(&self, task_id: &str) -> Result<String, ServiceError>;
    async fn get_all_todo(&self) -> Result<Vec<ToDoItem>, ServiceError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Business(#[from] BusinessError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failure raised while composing or invoking an endpoint
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Business(e) => e.kind(),
            ServiceError::Store(e) => e.kind(),
            ServiceError::Endpoint(e) => e.kind(),
        }
    }
}

/// Straightforward implementation of `AddService` over a `ToDoStore`.
#[derive(Clone)]
pub struct BasicService {
    store: Arc<dyn ToDoStore>,
}

impl BasicService {
    pub fn new(store: Arc<dyn ToDoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AddService for BasicService {
    async fn sum(&self, a: i64, b: i64) -> Result<i64, ServiceError> {
        if a == 0 && b == 0 {
            return Err(BusinessError::TwoZeroes.into());
        }

        let total = a
            .checked_add(b)
            .filter(|v| i32::try_from(*v).is_ok())
            .ok_or(BusinessError::IntOverflow)?;
        Ok(total)
    }

    async fn concat(&self, a: &str, b: &str) -> Result<String, ServiceError> {
        if a.len() + b.len() > MAX_CONCAT_LEN {
            return Err(BusinessError::MaxSizeExceeded.into());
        }
        Ok(format!("{a}{b}"))
    }

    async fn ping(&self) -> Result<String, ServiceError> {
        match self.store.ping().await {
            Ok(()) => Ok("up".to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "store ping failed");
                Ok("down".to_string())
            }
        }
    }

    async fn add_todo(&self, item: ToDoItem) -> Result<String, ServiceError> {
        Ok(self.store.insert_todo(item).await?)
    }

    async fn complete_todo(&self, task_id: &str) -> Result<String, ServiceError> {
        Ok(self.store.complete_todo(task_id).await?)
    }

    async fn undo_todo(&self, task_id: &str) -> Result<String, ServiceError> {
        Ok(self.store.undo_todo(task_id).await?)
    }

    async fn delete_todo(&self, task_id: &str) -> Result<String, ServiceError> {
        Ok(self.store.delete_todo(task_id).await?)
    }

    async fn get_all_todo(&self) -> Result<Vec<ToDoItem>, ServiceError> {
        Ok(self.store.get_all_todo().await?)
    }
}
