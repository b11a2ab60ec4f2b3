use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use stats_core::events::BlockSwaps;
use stats_core::types::{HeightRange, PoolRosterEntry, ReserveSnapshot};
use stats_core::{ChainClient, QueryOptions, Result, ScanConfig, StatsError};
use stats_store::AggregationState;
use tracing::info;

use crate::pagination::PaginatedQueryWalker;
use crate::resolver::BlockHeightResolver;
use crate::scanner::{BlockScanner, ScanStats};

/// Default span of a dump run when no begin height is given
pub const DEFAULT_DUMP_SPAN: u64 = 1000;

/// Block search query for heights with swap events inside `range`
pub fn swap_query(range: &HeightRange) -> String {
    format!(
        "swap_transacted.pool_id EXISTS AND block.height >= {} AND block.height <= {}",
        range.begin, range.end
    )
}

/// Result of a summary run
#[derive(Debug)]
pub struct SummaryReport {
    pub range: HeightRange,
    /// Heights the block search matched
    pub matched_heights: usize,
    pub scan: ScanStats,
    pub state: AggregationState,
}

impl SummaryReport {
    pub fn end_height(&self) -> u64 {
        self.range.end
    }

    pub fn has_swaps(&self) -> bool {
        self.matched_heights > 0
    }
}

/// Orchestrates the summary and dump runs against one chain.
pub struct SummaryEngine {
    client: Arc<dyn ChainClient>,
    scan: ScanConfig,
    shutdown: Arc<AtomicBool>,
}

impl SummaryEngine {
    pub fn new(client: Arc<dyn ChainClient>, scan: ScanConfig, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            client,
            scan,
            shutdown,
        }
    }

    fn check_shutdown(&self) -> Result<()> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(StatsError::Aborted("shutdown requested".to_string()));
        }
        Ok(())
    }

    async fn end_or_latest(&self, end: Option<u64>) -> Result<u64> {
        match given(end) {
            Some(end) => Ok(end),
            None => self.client.latest_height().await,
        }
    }

    /// Height range of a summary run: `begin` defaults to 1, `end` to the chain head
    pub async fn summary_range(&self, begin: Option<u64>, end: Option<u64>) -> Result<HeightRange> {
        let end = self.end_or_latest(end).await?;
        HeightRange::new(given(begin).unwrap_or(1), end)
    }

    /// Height range of a dump run: the last [`DEFAULT_DUMP_SPAN`] heights up
    /// to `end` unless `begin` is given
    pub async fn dump_range(&self, begin: Option<u64>, end: Option<u64>) -> Result<HeightRange> {
        let end = self.end_or_latest(end).await?;
        match given(begin) {
            Some(begin) => HeightRange::new(begin, end),
            None => HeightRange::trailing(end, DEFAULT_DUMP_SPAN),
        }
    }

    /// Pool roster at `opts`
    pub async fn roster(&self, opts: QueryOptions) -> Result<Vec<PoolRosterEntry>> {
        self.client.pools(opts).await
    }

    /// Roster and reserve balances pinned at `height`, ready to fold into
    pub async fn seed_state(&self, height: u64) -> Result<AggregationState> {
        let opts = QueryOptions::at_height(height);
        let roster = self.client.pools(opts).await?;
        info!(pools = roster.len(), height = height, "Loaded liquidity pools");

        let client = self.client.as_ref();
        let reserves: ReserveSnapshot = stream::iter(roster.iter())
            .map(|pool| async move {
                let [x, y] = &pool.reserve_coin_denoms;
                let address = &pool.reserve_account_address;
                let reserve_x = client.balance(address, x, opts).await?;
                let reserve_y = client.balance(address, y, opts).await?;
                Ok::<_, StatsError>((pool.id, [reserve_x, reserve_y]))
            })
            .buffered(self.scan.concurrency.max(1))
            .try_collect()
            .await?;

        AggregationState::seed(&roster, &reserves)
    }

    /// Aggregate every swap in the range into per-pool summaries.
    ///
    /// The state is seeded at `range.end`. Any error discards the state.
    pub async fn summary(&self, range: HeightRange) -> Result<SummaryReport> {
        self.check_shutdown()?;
        let mut state = self.seed_state(range.end).await?;

        self.check_shutdown()?;
        let query = swap_query(&range);
        let heights = PaginatedQueryWalker::new(self.client.as_ref(), self.scan.search_page_size)
            .walk(&query)
            .await?;
        info!(
            begin = range.begin,
            end = range.end,
            heights = heights.len(),
            "Found heights with swap events"
        );

        let matched_heights = heights.len();
        let scan = if heights.is_empty() {
            ScanStats::default()
        } else {
            self.scanner()
                .scan(heights, |block| state.fold_all(&block.events))
                .await?
        };

        let folded = state.stats();
        info!(
            swaps = folded.swaps_total,
            succeeded = folded.swaps_succeeded,
            failed = folded.swaps_failed,
            requesters = state.requesters().len(),
            "Summary aggregated"
        );

        Ok(SummaryReport {
            range,
            matched_heights,
            scan,
            state,
        })
    }

    /// Decode every height of the range in ascending order, handing each
    /// block's swaps to `on_block`. Heights without swaps are included.
    pub async fn dump<F>(&self, range: HeightRange, on_block: F) -> Result<ScanStats>
    where
        F: FnMut(BlockSwaps) -> Result<()>,
    {
        self.check_shutdown()?;
        info!(begin = range.begin, end = range.end, heights = range.count(), "Dumping swap events");
        self.scanner().scan(range.heights(), on_block).await
    }

    /// First block after `target`, with its time
    pub async fn search_block(&self, target: DateTime<Utc>) -> Result<Option<(u64, DateTime<Utc>)>> {
        let latest = self.client.latest_height().await?;
        let resolver = BlockHeightResolver::new(self.client.as_ref(), self.scan.floor_anchor_height);
        match resolver.resolve(target, latest).await? {
            Some(height) => {
                let time = self.client.block_time(height).await?;
                Ok(Some((height, time)))
            }
            None => Ok(None),
        }
    }

    fn scanner(&self) -> BlockScanner {
        BlockScanner::new(
            Arc::clone(&self.client),
            self.scan.concurrency,
            Arc::clone(&self.shutdown),
        )
    }
}

/// Height 0 is never a real block, so an explicit 0 asks for the default
fn given(height: Option<u64>) -> Option<u64> {
    height.filter(|&h| h > 0)
}
