//! Stream entry id assignment
//!
//! Ids are `<millis>-<seq>` with millis taken from the wall clock. When the
//! clock has not moved past the last id (same millisecond, or the clock
//! stepped backwards) the last millis is kept and seq is bumped, so ids stay
//! strictly increasing regardless of clock behaviour.

use fix_types::ids::StreamEntryId;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct IdGenerator {
    last: StreamEntryId,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            last: StreamEntryId::START,
        }
    }

    /// Continue after an existing log whose newest id is `last`.
    pub fn resume_after(last: StreamEntryId) -> Self {
        Self { last }
    }

    pub fn last(&self) -> StreamEntryId {
        self.last
    }

    pub fn next_id(&mut self) -> StreamEntryId {
        self.next_at(now_millis())
    }

    /// Next id given the current time in milliseconds.
    pub fn next_at(&mut self, millis: u64) -> StreamEntryId {
        let id = if millis > self.last.millis() {
            StreamEntryId::new(millis, 0)
        } else {
            match self.last.successor() {
                Some(next) => next,
                // seq exhausted within one millisecond: borrow the next one
                None => StreamEntryId::new(self.last.millis().saturating_add(1), 0),
            }
        };
        self.last = id;
        id
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
