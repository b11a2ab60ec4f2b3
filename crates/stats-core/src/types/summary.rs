use std::collections::BTreeMap;

use serde::Serialize;

use super::{Coin, PoolRosterEntry};
use crate::error::{Result, StatsError};

/// Reserve balances per pool id, taken at the summary height
pub type ReserveSnapshot = BTreeMap<u64, [Coin; 2]>;

/// Running swap totals for one side of a pool.
///
/// Side `i` offers reserve denom `i` and demands the other one, so the offer
/// accumulators are denominated in reserve `i` and the demand accumulators in
/// reserve `1 - i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapSummary {
    pub offer_coin: Coin,
    pub offer_coin_fee: Coin,
    pub demand_coin: Coin,
    pub demand_coin_fee: Coin,
}

impl SwapSummary {
    pub fn new(offer_denom: &str, demand_denom: &str) -> Self {
        Self {
            offer_coin: Coin::zero(offer_denom),
            offer_coin_fee: Coin::zero(offer_denom),
            demand_coin: Coin::zero(demand_denom),
            demand_coin_fee: Coin::zero(demand_denom),
        }
    }

    /// Accumulate one successful swap. Every addition is same-denom.
    pub fn accumulate(
        &mut self,
        offer_coin: &Coin,
        offer_coin_fee: &Coin,
        demand_coin: &Coin,
        demand_coin_fee: &Coin,
    ) -> Result<()> {
        // Validate all four before mutating so a failure leaves the totals untouched
        for (total, delta) in [
            (&self.offer_coin, offer_coin),
            (&self.offer_coin_fee, offer_coin_fee),
            (&self.demand_coin, demand_coin),
            (&self.demand_coin_fee, demand_coin_fee),
        ] {
            if total.denom != delta.denom {
                return Err(StatsError::DenomMismatch {
                    expected: total.denom.clone(),
                    actual: delta.denom.clone(),
                });
            }
        }
        self.offer_coin.checked_add_assign(offer_coin)?;
        self.offer_coin_fee.checked_add_assign(offer_coin_fee)?;
        self.demand_coin.checked_add_assign(demand_coin)?;
        self.demand_coin_fee.checked_add_assign(demand_coin_fee)?;
        Ok(())
    }
}

/// Per-pool statistics: reserve snapshot plus accumulated swaps per side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSummary {
    pub id: u64,
    pub reserve_coins: [Coin; 2],
    pub swaps: [SwapSummary; 2],
}

impl PoolSummary {
    /// Zero-initialized summary for a roster entry with its reserve snapshot.
    pub fn seed(pool: &PoolRosterEntry, reserve_coins: [Coin; 2]) -> Result<Self> {
        let [x, y] = &pool.reserve_coin_denoms;
        for (coin, denom) in reserve_coins.iter().zip([x, y]) {
            if &coin.denom != denom {
                return Err(StatsError::DenomMismatch {
                    expected: denom.clone(),
                    actual: coin.denom.clone(),
                });
            }
        }
        Ok(Self {
            id: pool.id,
            reserve_coins,
            swaps: [SwapSummary::new(x, y), SwapSummary::new(y, x)],
        })
    }

    /// Denom of reserve side `i`
    pub fn denom(&self, side: usize) -> &str {
        &self.reserve_coins[side].denom
    }
}
