use serde::{Deserialize, Serialize};

/// Liquidity pool as listed by the chain at a given height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRosterEntry {
    /// Unique pool identifier
    pub id: u64,
    /// Reserve denominations, in the pool's canonical order
    pub reserve_coin_denoms: [String; 2],
    /// Account holding the pool reserves
    pub reserve_account_address: String,
    /// Denomination of the pool's liquidity-share token
    pub pool_coin_denom: String,
}

impl PoolRosterEntry {
    /// Side a swap belongs to, keyed by its offer denom.
    /// Side 0 when the offer is the first reserve denom, side 1 otherwise.
    pub fn side_of(&self, offer_denom: &str) -> usize {
        if offer_denom == self.reserve_coin_denoms[0] {
            0
        } else {
            1
        }
    }
}
