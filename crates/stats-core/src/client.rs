use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::events::RawEvent;
use crate::types::{Coin, PoolRosterEntry};

/// Per-query options for state reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Pin the read to this height; `None` reads the latest state
    pub height: Option<u64>,
}

impl QueryOptions {
    pub fn latest() -> Self {
        Self::default()
    }

    pub fn at_height(height: u64) -> Self {
        Self {
            height: Some(height),
        }
    }
}

/// One page of a block search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Total matches across all pages as reported by the node
    pub total_count: u64,
    pub heights: Vec<u64>,
}

/// Read access to a chain node.
///
/// Implemented over HTTP by `stats-client` and by in-memory fakes in tests.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn latest_height(&self) -> Result<u64>;

    /// Header time of the block at `height`
    async fn block_time(&self, height: u64) -> Result<DateTime<Utc>>;

    /// Fetch one page (1-based) of heights whose events match `query`,
    /// in ascending height order
    async fn search_heights(&self, query: &str, page: u32, per_page: u32) -> Result<SearchPage>;

    async fn end_block_events(&self, height: u64) -> Result<Vec<RawEvent>>;

    /// Every liquidity pool, following pagination to the end
    async fn pools(&self, opts: QueryOptions) -> Result<Vec<PoolRosterEntry>>;

    async fn balance(&self, address: &str, denom: &str, opts: QueryOptions) -> Result<Coin>;
}
