// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batching dispatcher.
//!
//! Accepted messages are appended to a pending batch. The caller that brings the
//! batch to `min_in_batch` detaches it under the same lock and hands it, by move,
//! to a background flush task. Callers never wait on the upstream service; the
//! only synchronous failure is a rejected message id.

use crate::config::SmsProxyConfig;
use crate::errors::{Creation, RepositoryError};
use crate::fastsmsing::{FastSmsingClient, Message};
use crate::message::{MessageId, SendMessage};
use crate::repository::Repository;
use crate::statistics::{ClientResult, ClientStatistics};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

pub trait BatchingClient: Send + Sync {
    /// Records `id` and enqueues the message. Returns before any upstream I/O.
    fn send(&self, message: SendMessage, id: MessageId) -> Result<(), RepositoryError>;
}

pub struct SimpleBatchingClient {
    config: SmsProxyConfig,
    repository: Arc<dyn Repository>,
    client: Arc<dyn FastSmsingClient>,
    statistics: Arc<dyn ClientStatistics>,
    messages_to_send: Mutex<Vec<Message>>,
    runtime: Handle,
    flushes: TaskTracker,
}

impl SimpleBatchingClient {
    /// Builds a client bound to the current tokio runtime.
    pub fn new(
        repository: Arc<dyn Repository>,
        client: Arc<dyn FastSmsingClient>,
        config: SmsProxyConfig,
        statistics: Arc<dyn ClientStatistics>,
    ) -> Result<Self, Creation> {
        let runtime = Handle::try_current().map_err(|_| Creation::NoRuntime)?;
        Ok(Self::with_runtime(
            repository, client, config, statistics, runtime,
        ))
    }

    pub fn with_runtime(
        repository: Arc<dyn Repository>,
        client: Arc<dyn FastSmsingClient>,
        config: SmsProxyConfig,
        statistics: Arc<dyn ClientStatistics>,
        runtime: Handle,
    ) -> Self {
        Self {
            config,
            repository,
            client,
            statistics,
            messages_to_send: Mutex::new(Vec::new()),
            runtime,
            flushes: TaskTracker::new(),
        }
    }

    /// Number of messages waiting for the next flush.
    pub fn pending(&self) -> usize {
        #[allow(clippy::expect_used)]
        let pending = self.messages_to_send.lock().expect("lock poisoned");
        pending.len()
    }

    /// Flushes whatever is pending regardless of the batch threshold.
    ///
    /// Returns `None` when there was nothing to send.
    pub fn flush(&self) -> Option<JoinHandle<()>> {
        let batch = {
            #[allow(clippy::expect_used)]
            let mut pending = self.messages_to_send.lock().expect("lock poisoned");
            if pending.is_empty() {
                return None;
            }
            std::mem::take(&mut *pending)
        };
        Some(self.spawn_flush(batch))
    }

    /// Waits for every flush started so far, including threshold flushes.
    ///
    /// Messages still pending are not sent; call [`Self::flush`] first to drain them.
    pub async fn shutdown(&self) {
        self.flushes.close();
        debug!("Waiting for {} in-flight flushes", self.flushes.len());
        self.flushes.wait().await;
    }

    fn spawn_flush(&self, batch: Vec<Message>) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let statistics = Arc::clone(&self.statistics);
        let max_attempts = self.config.effective_max_attempts();

        debug!("Flushing batch of {} messages", batch.len());
        self.flushes.spawn_on(
            async move {
                let result = send_with_retry(client.as_ref(), batch, max_attempts).await;
                statistics.send(result);
            },
            &self.runtime,
        )
    }
}

impl BatchingClient for SimpleBatchingClient {
    fn send(&self, message: SendMessage, id: MessageId) -> Result<(), RepositoryError> {
        self.repository.save(&id)?;

        let detached = {
            #[allow(clippy::expect_used)]
            let mut pending = self.messages_to_send.lock().expect("lock poisoned");
            pending.push(Message::new(message, id));
            if pending.len() >= self.config.min_in_batch {
                Some(std::mem::take(&mut *pending))
            } else {
                None
            }
        };

        if let Some(batch) = detached {
            self.spawn_flush(batch);
        }
        Ok(())
    }
}

/// Sends `messages` up to `max_attempts` times, stopping at the first success.
///
/// `max_attempts` below 1 is treated as 1. Attempts are fired back to back.
pub async fn send_with_retry(
    client: &dyn FastSmsingClient,
    messages: Vec<Message>,
    max_attempts: u32,
) -> ClientResult {
    let max_attempts = max_attempts.max(1);
    let mut current_attempt = 0;
    let mut last_err = None;

    while current_attempt < max_attempts {
        current_attempt += 1;
        match client.send(&messages).await {
            Ok(()) => {
                last_err = None;
                break;
            }
            Err(e) => {
                warn!(
                    "Attempt {current_attempt}/{max_attempts} to send batch of {} messages failed: {e}",
                    messages.len()
                );
                last_err = Some(e);
            }
        }
    }

    ClientResult {
        messages_batch: messages,
        err: last_err,
        current_attempt,
        max_attempts,
    }
}
