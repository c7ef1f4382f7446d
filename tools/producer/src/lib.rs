//! FIX log replay
//!
//! Reads a log line by line, cuts every line into records at the header
//! marker and publishes each record to the stream in file order.

use fix_codec::Splitter;
use std::path::Path;
use stream::{Transport, TransportError};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

pub const DEFAULT_PROGRESS_EVERY: u64 = 1_000;

#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Publish failed after {published} records: {source}")]
    Publish {
        published: u64,
        #[source]
        source: TransportError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub lines: u64,
    pub published: u64,
}

pub struct Producer<T: Transport> {
    transport: T,
    splitter: Splitter,
    progress_every: u64,
}

impl<T: Transport> Producer<T> {
    pub fn new(transport: T, splitter: Splitter) -> Self {
        Self {
            transport,
            splitter,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    /// Log a progress line every `n` published records (0 disables).
    pub fn with_progress_every(mut self, n: u64) -> Self {
        self.progress_every = n;
        self
    }

    pub async fn publish_file(&self, path: &Path) -> Result<ProducerStats, ProducerError> {
        let file = File::open(path).await?;
        self.publish_from(BufReader::new(file)).await
    }

    /// Publish every record found in `reader`. Stops at the first failed
    /// publish; records before it stay published.
    pub async fn publish_from<R>(&self, reader: R) -> Result<ProducerStats, ProducerError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = ProducerStats::default();
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            stats.lines += 1;
            for record in self.splitter.split_line(&line) {
                let id = self
                    .transport
                    .publish(record.as_bytes())
                    .await
                    .map_err(|source| ProducerError::Publish {
                        published: stats.published,
                        source,
                    })?;
                stats.published += 1;
                debug!(id = %id, line = stats.lines, "Record published");

                if self.progress_every > 0 && stats.published % self.progress_every == 0 {
                    info!(published = stats.published, "Sent {} messages so far", stats.published);
                }
            }
        }

        info!(lines = stats.lines, published = stats.published, "Replay complete");
        Ok(stats)
    }
}
