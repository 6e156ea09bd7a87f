// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-batch delivery statistics.
//!
//! Every flushed batch produces exactly one [`ClientResult`]. The
//! [`StatisticsService`] consumes them off a channel, logs each outcome and keeps
//! running totals that can be queried through its [`StatisticsHandle`].

use crate::errors::SendError;
use crate::fastsmsing::Message;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Outcome of one flushed batch after the retry loop has finished.
#[derive(Debug)]
pub struct ClientResult {
    pub messages_batch: Vec<Message>,
    /// Error of the last attempt, `None` if an attempt succeeded.
    pub err: Option<SendError>,
    pub current_attempt: u32,
    pub max_attempts: u32,
}

impl ClientResult {
    pub fn is_success(&self) -> bool {
        self.err.is_none()
    }
}

/// Sink for batch outcomes. Fire-and-forget.
pub trait ClientStatistics: Send + Sync {
    fn send(&self, result: ClientResult);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSummary {
    pub batches: u64,
    pub successful_batches: u64,
    pub failed_batches: u64,
    pub delivered_messages: u64,
    pub dropped_messages: u64,
    pub attempts: u64,
}

impl StatisticsSummary {
    fn record(&mut self, result: &ClientResult) {
        let n_messages = result.messages_batch.len() as u64;
        self.batches += 1;
        self.attempts += u64::from(result.current_attempt);
        if result.is_success() {
            self.successful_batches += 1;
            self.delivered_messages += n_messages;
        } else {
            self.failed_batches += 1;
            self.dropped_messages += n_messages;
        }
    }
}

#[derive(Debug)]
pub enum StatisticsCommand {
    Record(ClientResult),
    Summary(oneshot::Sender<StatisticsSummary>),
    Shutdown,
}

#[derive(Clone, Debug)]
pub struct StatisticsHandle {
    tx: mpsc::UnboundedSender<StatisticsCommand>,
}

impl StatisticsHandle {
    pub fn record(
        &self,
        result: ClientResult,
    ) -> Result<(), mpsc::error::SendError<StatisticsCommand>> {
        self.tx.send(StatisticsCommand::Record(result))
    }

    pub async fn summary(&self) -> Result<StatisticsSummary, String> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(StatisticsCommand::Summary(response_tx))
            .map_err(|e| format!("Failed to send summary command: {}", e))?;

        response_rx
            .await
            .map_err(|e| format!("Failed to receive summary response: {}", e))
    }

    pub fn shutdown(&self) -> Result<(), mpsc::error::SendError<StatisticsCommand>> {
        self.tx.send(StatisticsCommand::Shutdown)
    }
}

impl ClientStatistics for StatisticsHandle {
    fn send(&self, result: ClientResult) {
        if let Err(e) = self.record(result) {
            error!("Dropping batch statistics, service is gone: {e}");
        }
    }
}

pub struct StatisticsService {
    summary: StatisticsSummary,
    rx: mpsc::UnboundedReceiver<StatisticsCommand>,
}

impl StatisticsService {
    pub fn new() -> (Self, StatisticsHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            summary: StatisticsSummary::default(),
            rx,
        };
        (service, StatisticsHandle { tx })
    }

    pub async fn run(mut self) -> StatisticsSummary {
        debug!("Statistics service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                StatisticsCommand::Record(result) => {
                    log_result(&result);
                    self.summary.record(&result);
                }

                StatisticsCommand::Summary(response_tx) => {
                    if response_tx.send(self.summary).is_err() {
                        error!("Failed to send summary response - receiver dropped");
                    }
                }

                StatisticsCommand::Shutdown => {
                    debug!("Statistics service shutting down");
                    break;
                }
            }
        }

        debug!("Statistics service stopped");
        self.summary
    }
}

fn log_result(result: &ClientResult) {
    let n_messages = result.messages_batch.len();
    match &result.err {
        None => info!(
            "Delivered batch of {n_messages} messages on attempt {}/{}",
            result.current_attempt, result.max_attempts
        ),
        Some(err) => warn!(
            "Dropped batch of {n_messages} messages after {}/{} attempts: {err}",
            result.current_attempt, result.max_attempts
        ),
    }
}
