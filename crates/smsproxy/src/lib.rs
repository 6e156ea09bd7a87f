// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batching SMS proxy.
//!
//! Accepted messages are recorded in a status store and accumulated into an
//! in-memory batch. Once the batch reaches the configured size it is detached
//! and shipped to the upstream bulk-sending service on a background task, with
//! bounded retry and one statistics record per flushed batch.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batching_client;
pub mod config;
pub mod errors;
pub mod fastsmsing;
pub mod logger;
pub mod message;
pub mod repository;
pub mod sms_proxy;
pub mod statistics;

pub use batching_client::{BatchingClient, SimpleBatchingClient};
pub use config::{Config, SmsProxyConfig};
pub use errors::{Creation, ProxyError, RepositoryError, SendError};
pub use fastsmsing::{FastSmsingClient, HttpFastSmsingClient, Message};
pub use message::{MessageId, MessageStatus, SendMessage, SendingResult};
pub use repository::{InMemoryRepository, Repository};
pub use sms_proxy::SmsProxy;
pub use statistics::{
    ClientResult, ClientStatistics, StatisticsHandle, StatisticsService, StatisticsSummary,
};
