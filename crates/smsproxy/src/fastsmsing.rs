// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Upstream bulk-sending service.
//!
//! The batching client only depends on the [`FastSmsingClient`] trait. The
//! bundled [`HttpFastSmsingClient`] posts each batch as a JSON array and treats
//! any 2xx response as success for the whole batch.

use crate::errors::{Creation, SendError};
use crate::message::{MessageId, SendMessage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Wire record for a single message inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub phone_number: String,
    pub message: String,
    pub message_id: MessageId,
}

impl Message {
    pub fn new(message: SendMessage, message_id: MessageId) -> Self {
        Self {
            phone_number: message.phone_number,
            message: message.message,
            message_id,
        }
    }
}

#[async_trait]
pub trait FastSmsingClient: Send + Sync {
    /// Sends a non-empty batch in one call. No partial outcome is reported.
    async fn send(&self, messages: &[Message]) -> Result<(), SendError>;
}

#[derive(Debug, Clone)]
pub struct HttpFastSmsingClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFastSmsingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Creation> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Creation::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/messages", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FastSmsingClient for HttpFastSmsingClient {
    async fn send(&self, messages: &[Message]) -> Result<(), SendError> {
        if messages.is_empty() {
            return Err(SendError::Payload("batch is empty".to_string()));
        }

        debug!("Sending batch of {} messages to {}", messages.len(), self.endpoint);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(messages)
            .send()
            .await
            .map_err(|e| {
                error!("Error sending batch: {e}");
                SendError::Transport(e.to_string())
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        // Body is only read on failure, for the error record.
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read upstream response body: {e}");
                String::new()
            }
        };
        error!("{status}: Failed to push batch to upstream: {body:?}");
        Err(SendError::Status { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn batch() -> Vec<Message> {
        vec![
            Message::new(SendMessage::new("+48100200300", "hello"), MessageId::from("a")),
            Message::new(SendMessage::new("+48100200301", "world"), MessageId::from("b")),
        ]
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(&batch()[0]).expect("serialize failed");
        assert_eq!(
            json,
            serde_json::json!({
                "phoneNumber": "+48100200300",
                "message": "hello",
                "messageId": "a",
            })
        );
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = HttpFastSmsingClient::new("http://localhost:1234/", Duration::from_secs(1))
            .expect("failed to build client");
        assert_eq!(client.endpoint(), "http://localhost:1234/messages");
    }

    #[tokio::test]
    async fn test_send_posts_json_batch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!([
                {"phoneNumber": "+48100200300", "message": "hello", "messageId": "a"},
                {"phoneNumber": "+48100200301", "message": "world", "messageId": "b"},
            ])))
            .with_status(202)
            .create_async()
            .await;

        let client = HttpFastSmsingClient::new(&server.url(), Duration::from_secs(1))
            .expect("failed to build client");

        client.send(&batch()).await.expect("send failed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_maps_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let client = HttpFastSmsingClient::new(&server.url(), Duration::from_secs(1))
            .expect("failed to build client");

        match client.send(&batch()).await {
            Err(SendError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "Internal Server Error");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_rejects_empty_batch() {
        let client = HttpFastSmsingClient::new("http://localhost:1", Duration::from_secs(1))
            .expect("failed to build client");
        assert!(matches!(
            client.send(&[]).await,
            Err(SendError::Payload(_))
        ));
    }
}
