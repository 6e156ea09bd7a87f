// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::message::{MessageId, MessageStatus};
use reqwest::StatusCode;

/// Errors raised by the message status store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("message id {0} already exists")]
    DuplicateId(MessageId),

    #[error("message id {0} not found")]
    NotFound(MessageId),

    #[error("message id {id} has final status {status} which cannot be overwritten")]
    TerminalStatusImmutable { id: MessageId, status: MessageStatus },
}

/// Failure of a single upstream send attempt for a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to reach upstream: {0}")]
    Transport(String),

    #[error("upstream rejected batch with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to prepare payload: {0}")]
    Payload(String),
}

/// Errors returned while building proxy components.
#[derive(Debug, thiserror::Error)]
pub enum Creation {
    #[error("no tokio runtime available to run flush tasks")]
    NoRuntime,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

/// Errors surfaced to callers of the proxy facade.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid message: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
