// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use smsproxy::{
    logger, BatchingClient, Config, HttpFastSmsingClient, InMemoryRepository, Repository,
    SendMessage, SimpleBatchingClient, SmsProxy, StatisticsService,
};

#[tokio::main]
pub async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error creating config on smsproxy startup: {e}");
            return;
        }
    };

    let env_filter = format!(
        "h2=off,hyper=off,rustls=off,reqwest=off,{}",
        config.log_level
    );

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .event_format(logger::Formatter)
        .with_writer(std::io::stderr)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let upstream = match HttpFastSmsingClient::new(&config.fastsmsing_url, config.timeout) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Error creating upstream client: {e}");
            return;
        }
    };

    let (statistics_service, statistics) = StatisticsService::new();
    let statistics_task = tokio::spawn(statistics_service.run());

    let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let batching_client = match SimpleBatchingClient::new(
        Arc::clone(&repository),
        upstream,
        config.batching,
        Arc::new(statistics.clone()),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Error creating batching client: {e}");
            return;
        }
    };
    let proxy = SmsProxy::new(
        Arc::clone(&batching_client) as Arc<dyn BatchingClient>,
        repository,
    );

    info!(
        "smsproxy started: batches of {} to {}, up to {} attempts",
        config.batching.min_in_batch,
        config.fastsmsing_url,
        config.batching.effective_max_attempts()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {e}");
                break;
            }
        };

        let Some((phone_number, text)) = line.split_once('\t') else {
            warn!("Skipping line without a tab separator");
            continue;
        };

        let output = match proxy.send(SendMessage::new(phone_number, text)) {
            Ok(result) => format!("{}\n", result.id),
            Err(e) => format!("rejected: {e}\n"),
        };
        if let Err(e) = stdout.write_all(output.as_bytes()).await {
            error!("Failed to write output: {e}");
            break;
        }
    }

    if let Err(e) = stdout.flush().await {
        error!("Failed to flush output: {e}");
    }

    if let Some(handle) = batching_client.flush() {
        if let Err(e) = handle.await {
            error!("Final flush failed: {e}");
        }
    }
    batching_client.shutdown().await;

    match statistics.summary().await {
        Ok(summary) => info!(
            "Shutting down: {} batches ({} failed), {} messages delivered, {} dropped",
            summary.batches,
            summary.failed_batches,
            summary.delivered_messages,
            summary.dropped_messages
        ),
        Err(e) => error!("{e}"),
    }

    match statistics.shutdown() {
        Ok(()) => {
            if let Err(e) = statistics_task.await {
                error!("Statistics service failed: {e}");
            }
        }
        Err(e) => error!("Failed to stop statistics service: {e}"),
    }
}
