// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::batching_client::BatchingClient;
use crate::errors::ProxyError;
use crate::message::{MessageId, MessageStatus, SendMessage, SendingResult};
use crate::repository::Repository;
use std::sync::Arc;
use tracing::debug;

/// Entry point for callers: assigns identifiers and answers status queries.
#[derive(Clone)]
pub struct SmsProxy {
    client: Arc<dyn BatchingClient>,
    repository: Arc<dyn Repository>,
}

impl SmsProxy {
    pub fn new(client: Arc<dyn BatchingClient>, repository: Arc<dyn Repository>) -> Self {
        Self { client, repository }
    }

    pub fn send(&self, message: SendMessage) -> Result<SendingResult, ProxyError> {
        validate(&message)?;

        let id = MessageId::generate();
        self.client.send(message, id.clone())?;
        debug!("Accepted message {id}");
        Ok(SendingResult { id })
    }

    pub fn get_status(&self, id: &MessageId) -> MessageStatus {
        self.repository.get(id)
    }
}

fn validate(message: &SendMessage) -> Result<(), ProxyError> {
    if message.phone_number.trim().is_empty() {
        return Err(ProxyError::Validation(
            "phone number cannot be empty".to_string(),
        ));
    }
    if message.message.is_empty() {
        return Err(ProxyError::Validation(
            "message text cannot be empty".to_string(),
        ));
    }
    Ok(())
}
