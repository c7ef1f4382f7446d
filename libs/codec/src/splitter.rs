//! Splitter — cuts concatenated messages apart on the header marker
//!
//! Raw FIX logs frequently hold several messages on one line. Every message
//! starts with the same `BeginString` field, so the line is split on that
//! marker and the marker is put back in front of each piece.

use fix_types::record::RawRecord;
use fix_types::tags::FIX44_HEADER;

/// Splits raw log lines into individual records.
#[derive(Debug, Clone)]
pub struct Splitter {
    marker: String,
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new(FIX44_HEADER)
    }
}

impl Splitter {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Split one line into records.
    ///
    /// Blank fragments are dropped. Every other fragment, including any
    /// text before the first marker, is trimmed and emitted with the marker
    /// re-attached; nothing is validated here.
    pub fn split_line(&self, line: &str) -> Vec<RawRecord> {
        if self.marker.is_empty() {
            let trimmed = line.trim();
            return if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![RawRecord::new(trimmed)]
            };
        }

        line.split(self.marker.as_str())
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .map(|fragment| {
                let mut record = String::with_capacity(self.marker.len() + fragment.len());
                record.push_str(&self.marker);
                record.push_str(fragment);
                RawRecord::new(record)
            })
            .collect()
    }

    /// Split every line of a log, preserving order.
    pub fn split_lines<'a, I>(&'a self, lines: I) -> impl Iterator<Item = RawRecord> + 'a
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: 'a,
    {
        lines
            .into_iter()
            .flat_map(move |line| self.split_line(line))
    }
}
