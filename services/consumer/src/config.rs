//! Consumer configuration
//!
//! Every knob can be given as a flag or through its environment variable.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// What the loop does when a record cannot be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PersistFailurePolicy {
    /// Stop without advancing the checkpoint; a restart retries the entry.
    #[default]
    Halt,
    /// Log the entry id and move on. The entry is lost once a later entry
    /// is checkpointed.
    Skip,
}

/// Loop tuning.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Wait before the first read, giving the stream time to come up.
    pub startup_delay: Duration,
    /// Upper bound on one blocking read.
    pub block_timeout: Duration,
    /// Entries requested per read.
    pub batch_size: usize,
    pub persist_failure_policy: PersistFailurePolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(5_000),
            block_timeout: Duration::from_millis(2_000),
            batch_size: 1,
            persist_failure_policy: PersistFailurePolicy::Halt,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "fix-consumer", version, about = "Consume FIX records from the stream into the record store")]
pub struct ConsumerArgs {
    /// Stream host
    #[arg(long, env = "STREAM_HOST", default_value = "localhost")]
    pub stream_host: String,

    /// Stream port
    #[arg(long, env = "STREAM_PORT", default_value_t = 8080)]
    pub stream_port: u16,

    /// File holding the last processed stream id
    #[arg(long, env = "CHECKPOINT_PATH", default_value = "last_stream_id.txt")]
    pub checkpoint_path: PathBuf,

    /// JSON-lines record store
    #[arg(long, env = "STORE_PATH", default_value = "data/fix_messages.jsonl")]
    pub store_path: PathBuf,

    #[arg(long, env = "STARTUP_DELAY_MS", default_value_t = 5_000)]
    pub startup_delay_ms: u64,

    /// Longest blocking read, in milliseconds
    #[arg(long, env = "BLOCK_MS", default_value_t = 2_000)]
    pub block_ms: u64,

    #[arg(long, env = "BATCH_SIZE", default_value_t = 1)]
    pub batch_size: usize,

    #[arg(long, env = "PERSIST_FAILURE_POLICY", value_enum, default_value_t = PersistFailurePolicy::Halt)]
    pub persist_failure_policy: PersistFailurePolicy,
}

impl ConsumerArgs {
    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            startup_delay: Duration::from_millis(self.startup_delay_ms),
            block_timeout: Duration::from_millis(self.block_ms),
            batch_size: self.batch_size.max(1),
            persist_failure_policy: self.persist_failure_policy,
        }
    }
}
