use chrono::{DateTime, Utc};
use stats_core::{ChainClient, Result, StatsError};
use tracing::debug;

/// Finds the first block after a point in time.
///
/// Block time is assumed non-decreasing from `floor_anchor` upwards. Heights
/// below the anchor never match, whatever their recorded time.
pub struct BlockHeightResolver<'a> {
    client: &'a dyn ChainClient,
    floor_anchor: u64,
}

impl<'a> BlockHeightResolver<'a> {
    pub fn new(client: &'a dyn ChainClient, floor_anchor: u64) -> Self {
        Self {
            client,
            floor_anchor,
        }
    }

    /// Smallest height in `[floor_anchor, latest]` whose block time is
    /// strictly after `target`, or `None` when no such block exists yet.
    ///
    /// Lower-bound binary search over `[0, latest + 1)`. Any failed time
    /// lookup aborts the search with `OracleUnavailable`.
    pub async fn resolve(&self, target: DateTime<Utc>, latest: u64) -> Result<Option<u64>> {
        let mut lo = 0u64;
        let mut hi = latest.saturating_add(1);
        let mut lookups = 0u32;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let past_target = if mid < self.floor_anchor {
                false
            } else {
                lookups += 1;
                self.block_time(mid).await? > target
            };
            if past_target {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        debug!(
            target = %target,
            latest = latest,
            floor_anchor = self.floor_anchor,
            lookups = lookups,
            result = lo,
            "Block height search finished"
        );

        Ok((lo <= latest).then_some(lo))
    }

    async fn block_time(&self, height: u64) -> Result<DateTime<Utc>> {
        self.client
            .block_time(height)
            .await
            .map_err(|e| StatsError::OracleUnavailable {
                height,
                reason: e.to_string(),
            })
    }
}
