// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a message before it is enqueued.
///
/// Used as the status store key and as the correlation key on the wire.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    #[display("ACCEPTED")]
    Accepted,
    #[display("DELIVERED")]
    Delivered,
    #[display("FAILED")]
    Failed,
    /// Returned on lookup miss, never stored.
    #[display("NOT_FOUND")]
    NotFound,
}

impl MessageStatus {
    /// Final statuses cannot be overwritten once set.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }
}

/// Outbound text message as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub phone_number: String,
    pub message: String,
}

impl SendMessage {
    pub fn new(phone_number: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            message: message.into(),
        }
    }
}

/// Acknowledgement returned once a message has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendingResult {
    pub id: MessageId,
}
