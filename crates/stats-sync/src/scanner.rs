use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{stream, StreamExt};
use stats_core::events::{decode_swaps, BlockSwaps};
use stats_core::{ChainClient, Result, StatsError};
use stats_metrics::counters;
use tracing::{debug, info, warn};

/// Totals of one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub heights: u64,
    pub swaps: u64,
    pub failed_swaps: u64,
}

/// Fetches and decodes end-block swap events height by height.
///
/// Up to `concurrency` heights are in flight at once, but blocks are handed
/// to the caller in the order the heights were given. The first error stops
/// the scan and drops every outstanding request.
pub struct BlockScanner {
    client: Arc<dyn ChainClient>,
    concurrency: usize,
    /// Checked before each height is requested
    shutdown: Arc<AtomicBool>,
}

impl BlockScanner {
    pub fn new(client: Arc<dyn ChainClient>, concurrency: usize, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
            shutdown,
        }
    }

    pub async fn scan<I, F>(&self, heights: I, mut on_block: F) -> Result<ScanStats>
    where
        I: IntoIterator<Item = u64>,
        F: FnMut(BlockSwaps) -> Result<()>,
    {
        let blocks = stream::iter(heights)
            .map(|height| {
                let client = Arc::clone(&self.client);
                let shutdown = Arc::clone(&self.shutdown);
                async move { fetch_block(client.as_ref(), &shutdown, height).await }
            })
            .buffered(self.concurrency);
        let mut blocks = std::pin::pin!(blocks);

        let mut stats = ScanStats::default();
        while let Some(block) = blocks.next().await {
            let block = block.inspect_err(|e| {
                if !e.is_aborted() {
                    counters::errors(1, "scan");
                }
            })?;

            let failed = block.events.iter().filter(|s| !s.is_success()).count() as u64;
            stats.heights += 1;
            stats.swaps += block.events.len() as u64;
            stats.failed_swaps += failed;
            counters::heights_scanned(1);
            counters::swap_events(block.events.len() as u64);
            counters::swap_events_failed(failed);

            on_block(block)?;

            if stats.heights % 1000 == 0 {
                info!(heights = stats.heights, swaps = stats.swaps, "Scan progress");
            }
        }

        info!(
            heights = stats.heights,
            swaps = stats.swaps,
            failed_swaps = stats.failed_swaps,
            "Scan complete"
        );
        Ok(stats)
    }
}

async fn fetch_block(client: &dyn ChainClient, shutdown: &AtomicBool, height: u64) -> Result<BlockSwaps> {
    if shutdown.load(Ordering::Relaxed) {
        return Err(StatsError::Aborted(format!(
            "shutdown requested before height {height}"
        )));
    }

    let raw = client.end_block_events(height).await.inspect_err(|e| {
        warn!(height = height, error = %e, "Failed to fetch end-block events");
    })?;
    let events = decode_swaps(&raw).inspect_err(|e| {
        warn!(height = height, error = %e, "Failed to decode swap event");
    })?;

    debug!(height = height, raw = raw.len(), swaps = events.len(), "Block scanned");
    Ok(BlockSwaps { height, events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{failed_swap_event, swap_event, FakeChain};
    use stats_core::events::RawEvent;

    fn chain() -> FakeChain {
        let mut chain = FakeChain::new(100);
        for h in 1..=20u64 {
            let mut events = vec![RawEvent::from_pairs("transfer", [("amount", "1uatom")])];
            if h % 2 == 0 {
                events.push(swap_event(1, "alice", ("uatom", h * 10), ("uusd", h * 9)));
            }
            if h % 5 == 0 {
                events.push(failed_swap_event(1, "bob", ("uusd", 3)));
            }
            chain.events.insert(h, events);
        }
        chain
    }

    #[tokio::test]
    async fn test_blocks_arrive_in_height_order() {
        let client: Arc<dyn ChainClient> = Arc::new(chain());
        let scanner = BlockScanner::new(client, 8, Arc::new(AtomicBool::new(false)));

        let mut seen = Vec::new();
        let stats = scanner
            .scan(1..=20, |block| {
                seen.push(block.height);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(seen, (1..=20).collect::<Vec<_>>());
        assert_eq!(
            stats,
            ScanStats {
                heights: 20,
                swaps: 14,
                failed_swaps: 4,
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_scan() {
        let mut chain = chain();
        chain.failing_heights.insert(7);
        let scanner = BlockScanner::new(Arc::new(chain), 4, Arc::new(AtomicBool::new(false)));

        let mut seen = Vec::new();
        let err = scanner
            .scan(1..=20, |block| {
                seen.push(block.height);
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::Rpc(_)));
        assert_eq!(seen, (1..=6).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_decode_error_aborts_scan() {
        let mut chain = chain();
        chain.events.insert(
            3,
            vec![RawEvent::from_pairs(
                "swap_transacted",
                [("success", "success"), ("pool_id", "x")],
            )],
        );
        let scanner = BlockScanner::new(Arc::new(chain), 1, Arc::new(AtomicBool::new(false)));
        let err = scanner.scan(1..=5, |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, StatsError::MalformedNumber { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_aborts() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let scanner = BlockScanner::new(Arc::new(chain()), 1, Arc::clone(&shutdown));

        let flag = Arc::clone(&shutdown);
        let err = scanner
            .scan(1..=20, move |block| {
                if block.height == 3 {
                    flag.store(true, Ordering::SeqCst);
                }
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(err.is_aborted());
    }

    #[tokio::test]
    async fn test_callback_error_stops_scan() {
        let scanner = BlockScanner::new(Arc::new(chain()), 2, Arc::new(AtomicBool::new(false)));
        let err = scanner
            .scan(1..=20, |block| {
                if block.height == 2 {
                    Err(StatsError::UnknownPool(9))
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::UnknownPool(9)));
    }
}
