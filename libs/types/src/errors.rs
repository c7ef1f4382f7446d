//! Error types for the shared FIX types

use thiserror::Error;

/// Failure to parse a `StreamEntryId` from its `<millis>-<seq>` text form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdParseError {
    #[error("empty stream entry id")]
    Empty,

    #[error("invalid millis component in stream entry id: {0:?}")]
    InvalidMillis(String),

    #[error("invalid sequence component in stream entry id: {0:?}")]
    InvalidSequence(String),
}
