use serde::Serialize;

use crate::HlsError;

/// An inclusive `[start, end]` byte range within a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// The range of `length` bytes starting at `start`, if non-empty.
    pub fn from_length(start: u64, length: u64) -> Option<Self> {
        let last = length.checked_sub(1)?;
        Some(Self {
            start,
            end: start.checked_add(last)?,
        })
    }

    /// Parse a `length[@offset]` attribute value.
    ///
    /// Without an explicit offset the range starts at `default_start`.
    pub fn parse(value: &str, default_start: u64) -> Result<Self, HlsError> {
        let invalid = || HlsError::invalid_value("BYTERANGE", value);
        let (length, offset) = match value.trim().split_once('@') {
            Some((length, offset)) => (length, Some(offset)),
            None => (value.trim(), None),
        };
        let length: u64 = length.trim().parse().map_err(|_| invalid())?;
        let start = match offset {
            Some(offset) => offset.trim().parse().map_err(|_| invalid())?,
            None => default_start,
        };
        Self::from_length(start, length).ok_or_else(invalid)
    }

    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// First byte after this range
    pub fn next_start(&self) -> u64 {
        self.end + 1
    }

    /// Value for an HTTP `Range` request header
    pub fn to_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}
