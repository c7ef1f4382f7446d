//! Persistence for the FIX ingestion pipeline
//!
//! Everything here is synchronous file I/O with explicit durability points:
//! - `journal`: append-only stream journal with CRC32C-framed entries
//! - `reader`: sequential journal reader with torn-tail repair
//! - `checkpoint`: the consumer's resume cursor, replaced atomically
//! - `store`: the record store the consumer writes and reports read

pub mod journal;
pub mod reader;
pub mod checkpoint;
pub mod store;
