// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Message status store.
//!
//! Single source of truth for message lifecycle. Every message starts as
//! [`MessageStatus::Accepted`] and may move to [`MessageStatus::Delivered`] or
//! [`MessageStatus::Failed`], both of which are final.

use crate::errors::RepositoryError;
use crate::message::{MessageId, MessageStatus};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};

pub trait Repository: Send + Sync {
    /// Registers `id` as accepted. Fails if `id` is already known.
    fn save(&self, id: &MessageId) -> Result<(), RepositoryError>;

    /// Returns the current status of `id`, or [`MessageStatus::NotFound`].
    fn get(&self, id: &MessageId) -> MessageStatus;

    /// Overwrites the status of a known, non-final message.
    fn update(&self, id: &MessageId, new_status: MessageStatus) -> Result<(), RepositoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    db: RwLock<HashMap<MessageId, MessageStatus>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        #[allow(clippy::expect_used)]
        let db = self.db.read().expect("lock poisoned");
        db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Repository for InMemoryRepository {
    fn save(&self, id: &MessageId) -> Result<(), RepositoryError> {
        #[allow(clippy::expect_used)]
        let mut db = self.db.write().expect("lock poisoned");

        if db.contains_key(id) {
            warn!("Rejecting duplicate message id {id}");
            return Err(RepositoryError::DuplicateId(id.clone()));
        }

        db.insert(id.clone(), MessageStatus::Accepted);
        Ok(())
    }

    fn get(&self, id: &MessageId) -> MessageStatus {
        #[allow(clippy::expect_used)]
        let db = self.db.read().expect("lock poisoned");
        db.get(id).copied().unwrap_or(MessageStatus::NotFound)
    }

    fn update(&self, id: &MessageId, new_status: MessageStatus) -> Result<(), RepositoryError> {
        #[allow(clippy::expect_used)]
        let mut db = self.db.write().expect("lock poisoned");

        let Some(current) = db.get_mut(id) else {
            return Err(RepositoryError::NotFound(id.clone()));
        };

        // Only the current status is checked; the new one is taken as-is.
        if current.is_terminal() {
            return Err(RepositoryError::TerminalStatusImmutable {
                id: id.clone(),
                status: *current,
            });
        }

        debug!("Message {id} moved from {current} to {new_status}");
        *current = new_status;
        Ok(())
    }
}
