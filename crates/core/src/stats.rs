//! Library-wide reading statistics.

use serde::Serialize;

use crate::status::ReadingStatus;

/// The slice of a book needed to compute statistics.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEntry {
    pub status: ReadingStatus,
    pub pages: Option<i32>,
    pub total_pages: Option<i32>,
    pub current_page: Option<i32>,
}

impl ProgressEntry {
    /// Pages the reader has gone through for this book.
    ///
    /// `current_page` wins when set. A completed book without progress
    /// counts its full length.
    pub fn pages_read(&self) -> i64 {
        match self.current_page {
            Some(page) => i64::from(page),
            None if self.status.is_complete() => {
                i64::from(self.total_pages.or(self.pages).unwrap_or(0))
            }
            None => 0,
        }
    }
}

/// Counts per status plus total pages read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total: i64,
    pub to_read: i64,
    pub reading: i64,
    pub read: i64,
    pub paused: i64,
    pub finished: i64,
    pub abandoned: i64,
    pub pages_read: i64,
}

impl LibraryStats {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ProgressEntry>,
    {
        let mut stats = LibraryStats::default();
        for entry in entries {
            stats.total += 1;
            stats.pages_read += entry.pages_read();
            *stats.counter_mut(entry.status) += 1;
        }
        stats
    }

    fn counter_mut(&mut self, status: ReadingStatus) -> &mut i64 {
        match status {
            ReadingStatus::ToRead => &mut self.to_read,
            ReadingStatus::Reading => &mut self.reading,
            ReadingStatus::Read => &mut self.read,
            ReadingStatus::Paused => &mut self.paused,
            ReadingStatus::Finished => &mut self.finished,
            ReadingStatus::Abandoned => &mut self.abandoned,
        }
    }
}
