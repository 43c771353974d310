//! Reading status of a book.
//!
//! The canonical enumeration is the six-value uppercase set. Older clients
//! sent `to-read | reading | finished` and the first UI iteration used
//! Portuguese labels; both spellings are accepted on input and mapped onto
//! the canonical value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

/// Where a reader is with a given book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStatus {
    #[default]
    ToRead,
    Reading,
    Read,
    Paused,
    Finished,
    Abandoned,
}

impl ReadingStatus {
    /// Every status in declaration order.
    pub const ALL: [ReadingStatus; 6] = [
        ReadingStatus::ToRead,
        ReadingStatus::Reading,
        ReadingStatus::Read,
        ReadingStatus::Paused,
        ReadingStatus::Finished,
        ReadingStatus::Abandoned,
    ];

    /// The value stored in the `books.status` column and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "TO_READ",
            ReadingStatus::Reading => "READING",
            ReadingStatus::Read => "READ",
            ReadingStatus::Paused => "PAUSED",
            ReadingStatus::Finished => "FINISHED",
            ReadingStatus::Abandoned => "ABANDONED",
        }
    }

    /// Whether the book has been read through.
    pub fn is_complete(self) -> bool {
        matches!(self, ReadingStatus::Read | ReadingStatus::Finished)
    }

    /// Parse a status from user input, accepting legacy spellings.
    ///
    /// Matching ignores case, surrounding whitespace, and treats `-` and
    /// spaces as `_`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "TO_READ" | "QUERO_LER" => Ok(ReadingStatus::ToRead),
            "READING" | "LENDO" => Ok(ReadingStatus::Reading),
            "READ" | "LIDO" => Ok(ReadingStatus::Read),
            "PAUSED" | "PAUSADO" => Ok(ReadingStatus::Paused),
            "FINISHED" => Ok(ReadingStatus::Finished),
            "ABANDONED" | "ABANDONADO" => Ok(ReadingStatus::Abandoned),
            _ => Err(CoreError::Validation(format!(
                "Invalid status '{raw}'. Must be one of: {}",
                ReadingStatus::ALL.map(ReadingStatus::as_str).join(", ")
            ))),
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for ReadingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
