use std::ops::RangeInclusive;

use crate::error::{Result, StatsError};

/// Inclusive range of block heights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightRange {
    pub begin: u64,
    pub end: u64,
}

impl HeightRange {
    pub fn new(begin: u64, end: u64) -> Result<Self> {
        if begin > end {
            return Err(StatsError::InvalidRange { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Range of at most `span` heights ending at `end`, never starting below height 1
    pub fn trailing(end: u64, span: u64) -> Result<Self> {
        let begin = end.saturating_sub(span.saturating_sub(1)).max(1);
        Self::new(begin, end)
    }

    /// Number of heights in the range
    pub fn count(&self) -> u64 {
        self.end - self.begin + 1
    }

    pub fn heights(&self) -> RangeInclusive<u64> {
        self.begin..=self.end
    }
}
