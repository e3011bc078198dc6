use std::{sync::Arc, time::Duration};

use alloy::{
    providers::{DynProvider, Provider},
    rpc::types::{Filter, Log},
};
use anyhow::Context;
use async_trait::async_trait;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use crate::state::SynchronizableStateSource;

/// Maximum block span requested in one `eth_getLogs`
const MAX_LOG_RANGE: u64 = 2_000;

/// Next inclusive block range to scan after `last_block`, or `None` when the
/// head has not moved.
fn next_range(last_block: u64, head: u64) -> Option<(u64, u64)> {
    (head > last_block).then(|| (last_block + 1, head.min(last_block + MAX_LOG_RANGE)))
}

/// Chain head and log reads used by [`LogPoller`].
#[async_trait]
pub trait LogFeed: Send + Sync {
    async fn head(&self) -> anyhow::Result<u64>;

    async fn logs(&self, filter: &Filter) -> anyhow::Result<Vec<Log>>;
}

#[async_trait]
impl LogFeed for DynProvider {
    async fn head(&self) -> anyhow::Result<u64> {
        self.get_block_number()
            .await
            .context("Failed to fetch chain head")
    }

    async fn logs(&self, filter: &Filter) -> anyhow::Result<Vec<Log>> {
        self.get_logs(filter).await.context("Failed to fetch logs")
    }
}

/// Drives one [`SynchronizableStateSource`] from the chain's log stream.
///
/// Logs are fetched for the source's subscribed addresses and handed to
/// `process_log` strictly one at a time, the first of each range on top of
/// the source's last committed state. The cursor only advances once a whole
/// range went through. Any failure, including the cold start, is logged and
/// retried on the next tick.
pub struct LogPoller<S, F = DynProvider> {
    feed: F,
    source: Arc<S>,
    poll_interval: Duration,
}

impl<S, F> LogPoller<S, F>
where
    S: SynchronizableStateSource + 'static,
    F: LogFeed,
{
    pub fn new(feed: F, source: Arc<S>, poll_interval: Duration) -> Self {
        Self {
            feed,
            source,
            poll_interval,
        }
    }

    /// Poll until `cancellation_token` fires. Without a `start_block` the
    /// source is cold-started at the head seen on the first attempt.
    pub async fn run(&self, start_block: Option<u64>, cancellation_token: CancellationToken) {
        let name = self.source.name();
        let mut last_block: Option<u64> = None;

        loop {
            match last_block {
                None => match self.cold_start(start_block).await {
                    Ok(block_number) => {
                        info!("{}: synced at block {}", name, block_number);
                        last_block = Some(block_number);
                    },
                    Err(e) => error!("{}: cold start failed, retrying: {:#}", name, e),
                },
                Some(block_number) => match self.poll(block_number).await {
                    Ok(Some(to_block)) => last_block = Some(to_block),
                    Ok(None) => {},
                    Err(e) => {
                        error!(
                            "{}: sync after block {} failed, retrying: {:#}",
                            name, block_number, e
                        )
                    },
                },
            }

            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("{}: received cancellation signal", name);
                    break;
                },
                _ = tokio::time::sleep(self.poll_interval) => {},
            }
        }
    }

    async fn cold_start(&self, start_block: Option<u64>) -> anyhow::Result<u64> {
        let block_number = match start_block {
            Some(block_number) => block_number,
            None => self.feed.head().await?,
        };

        self.source
            .get_state_or_generate(block_number, false)
            .await
            .with_context(|| {
                format!("{}: cold start at block {}", self.source.name(), block_number)
            })?;

        Ok(block_number)
    }

    /// One cycle after `last_block`. Returns the new cursor when a range was
    /// synced, `None` when the head has not moved.
    async fn poll(&self, last_block: u64) -> anyhow::Result<Option<u64>> {
        let head = self.feed.head().await?;

        let Some((from_block, to_block)) = next_range(last_block, head) else {
            return Ok(None);
        };

        self.sync_range(last_block, from_block, to_block).await?;

        Ok(Some(to_block))
    }

    async fn sync_range(
        &self,
        last_block: u64,
        from_block: u64,
        to_block: u64,
    ) -> anyhow::Result<()> {
        let filter = Filter::new()
            .address(self.source.addresses_subscribed().to_vec())
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.feed.logs(&filter).await?;
        if logs.is_empty() {
            return Ok(());
        }

        let mut state = match self.source.store().latest().await {
            Some((_, state)) => state,
            // Last commit already evicted
            None => self.source.get_state_or_generate(last_block, false).await?,
        };

        for log in logs.iter().filter(|log| !log.removed) {
            if let Some(new_state) = self.source.process_log(&state, log).await? {
                state = new_state;
            }
        }

        Ok(())
    }
}
