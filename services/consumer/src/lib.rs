//! Consumer side of the FIX ingestion pipeline
//!
//! Reads raw records from the stream after a durable cursor, decodes them,
//! stores one row per record and advances the cursor only once the row is
//! stored. A restart resumes after the last checkpointed entry.

pub mod config;
pub mod pipeline;

pub use config::{ConsumerArgs, ConsumerConfig, PersistFailurePolicy};
pub use pipeline::{ConsumerError, ConsumerState, ConsumerStats, StreamConsumer};
