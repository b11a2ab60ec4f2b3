use stats_core::{ChainClient, Result, StatsError};
use tracing::debug;

/// Drains a paged block search into one ordered list of heights.
///
/// The page count is derived from the total reported by page 1 and is not
/// recomputed afterwards, so matches added while walking may be missed.
pub struct PaginatedQueryWalker<'a> {
    client: &'a dyn ChainClient,
    page_size: u32,
}

impl<'a> PaginatedQueryWalker<'a> {
    pub fn new(client: &'a dyn ChainClient, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// All heights matching `query`. Any failed page fails the whole walk.
    pub async fn walk(&self, query: &str) -> Result<Vec<u64>> {
        let first = self.fetch(query, 1).await?;
        if first.total_count == 0 {
            return Ok(Vec::new());
        }

        let max_page = u32::try_from(first.total_count.div_ceil(u64::from(self.page_size)))
            .map_err(|_| {
                StatsError::Decode(format!("block search total {} too large", first.total_count))
            })?;
        debug!(
            total = first.total_count,
            page_size = self.page_size,
            max_page = max_page,
            "Walking block search"
        );

        let mut heights = first.heights;
        for page in 2..=max_page {
            heights.extend(self.fetch(query, page).await?.heights);
        }
        Ok(heights)
    }

    async fn fetch(&self, query: &str, page: u32) -> Result<stats_core::SearchPage> {
        self.client
            .search_heights(query, page, self.page_size)
            .await
            .map_err(|e| StatsError::PageFetchFailed {
                page,
                reason: e.to_string(),
            })
    }
}
