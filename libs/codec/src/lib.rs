//! FIX codec
//!
//! Pure, allocation-light functions that sit on either side of the stream:
//! - `splitter`: producer side, cuts a raw log line into individual records
//! - `decoder`: consumer side, turns one record into a tag → value map
//!
//! Neither function fails. Malformed input is tolerated: the splitter
//! forwards odd fragments unchanged and the decoder skips tokens it cannot
//! read.

pub mod decoder;
pub mod splitter;

pub use decoder::{decode, decode_ordered, normalize, FIELD_SEPARATOR, SOH};
pub use splitter::Splitter;
