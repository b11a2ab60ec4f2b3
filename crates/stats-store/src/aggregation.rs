use std::collections::{BTreeMap, BTreeSet};

use stats_core::events::SwapTransacted;
use stats_core::types::{PoolRosterEntry, PoolSummary, ReserveSnapshot};
use stats_core::{Result, StatsError};
use tracing::debug;

/// Counters over every folded swap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldStats {
    pub swaps_total: u64,
    pub swaps_succeeded: u64,
    pub swaps_failed: u64,
}

/// Per-run aggregation of swap events into pool summaries.
///
/// Owned by exactly one run. Pools are fixed at seeding time; folding only
/// mutates their swap accumulators, so the final rows do not depend on the
/// order events arrive in.
#[derive(Debug, Clone)]
pub struct AggregationState {
    /// Pool ids in roster order
    order: Vec<u64>,
    pools: BTreeMap<u64, PoolSummary>,
    denoms: BTreeSet<String>,
    requesters: BTreeSet<String>,
    stats: FoldStats,
}

impl AggregationState {
    /// Seed one zeroed summary per roster pool, with reserves from the snapshot
    pub fn seed(roster: &[PoolRosterEntry], reserves: &ReserveSnapshot) -> Result<Self> {
        let mut order = Vec::with_capacity(roster.len());
        let mut pools = BTreeMap::new();
        let mut denoms = BTreeSet::new();

        for pool in roster {
            let reserve_coins = reserves
                .get(&pool.id)
                .cloned()
                .ok_or(StatsError::MissingReserve(pool.id))?;
            let summary = PoolSummary::seed(pool, reserve_coins)?;
            if pools.insert(pool.id, summary).is_some() {
                return Err(StatsError::DuplicatePool(pool.id));
            }
            order.push(pool.id);
            denoms.extend(pool.reserve_coin_denoms.iter().cloned());
        }

        debug!(
            pools = order.len(),
            denoms = denoms.len(),
            "Aggregation state seeded"
        );

        Ok(Self {
            order,
            pools,
            denoms,
            requesters: BTreeSet::new(),
            stats: FoldStats::default(),
        })
    }

    /// Fold one decoded swap.
    ///
    /// Failed swaps only count towards [`FoldStats`]. A successful swap must
    /// reference a seeded pool; its offer denom picks the side.
    pub fn fold(&mut self, swap: &SwapTransacted) -> Result<()> {
        self.stats.swaps_total += 1;

        let Some(fill) = &swap.fill else {
            self.stats.swaps_failed += 1;
            return Ok(());
        };

        let summary = self
            .pools
            .get_mut(&swap.pool_id)
            .ok_or(StatsError::UnknownPool(swap.pool_id))?;

        let side = if swap.offer_coin.denom == summary.denom(0) {
            0
        } else {
            1
        };
        summary.swaps[side].accumulate(
            &swap.offer_coin,
            &fill.offer_coin_fee,
            &fill.demand_coin,
            &fill.demand_coin_fee,
        )?;

        self.stats.swaps_succeeded += 1;
        if !self.requesters.contains(&swap.swap_requester) {
            self.requesters.insert(swap.swap_requester.clone());
        }
        Ok(())
    }

    pub fn fold_all<'a, I>(&mut self, swaps: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a SwapTransacted>,
    {
        swaps.into_iter().try_for_each(|swap| self.fold(swap))
    }

    /// Pool summaries in roster order
    pub fn rows(&self) -> impl Iterator<Item = &PoolSummary> + '_ {
        self.order.iter().filter_map(|id| self.pools.get(id))
    }

    pub fn pool(&self, id: u64) -> Option<&PoolSummary> {
        self.pools.get(&id)
    }

    pub fn denoms(&self) -> &BTreeSet<String> {
        &self.denoms
    }

    pub fn requesters(&self) -> &BTreeSet<String> {
        &self.requesters
    }

    pub fn stats(&self) -> FoldStats {
        self.stats
    }
}
