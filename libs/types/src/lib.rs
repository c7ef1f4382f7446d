//! Types library for the FIX stream ingestion pipeline
//!
//! Shared definitions used by the codec, the stream transport, the consumer
//! loop, the record store and the report engine.
//!
//! # Modules
//! - `ids`: Stream cursor (`StreamEntryId`) and stored record identifiers
//! - `record`: Raw payloads, decoded field maps and the stored projection
//! - `tags`: FIX tag numbers and their dictionary names
//! - `errors`: Parse errors for the types above

pub mod ids;
pub mod record;
pub mod tags;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::record::*;
    pub use crate::tags::*;
    pub use crate::errors::*;
}
