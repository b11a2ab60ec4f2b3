//! Pool-share holders in a genesis file

use std::collections::HashMap;
use std::io::Read;

use serde::Deserialize;
use stats_core::types::{Coin, PoolRosterEntry};
use stats_core::{Result, StatsError};
use tracing::info;

/// One account's balances from `app_state.bank.balances`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisBalance {
    pub address: String,
    #[serde(default)]
    pub coins: Vec<Coin>,
}

#[derive(Deserialize)]
struct Genesis {
    app_state: AppState,
}

#[derive(Deserialize)]
struct AppState {
    bank: BankState,
}

#[derive(Deserialize)]
struct BankState {
    #[serde(default)]
    balances: Vec<GenesisBalance>,
}

/// Number of accounts holding a pool's share token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolInvestors {
    pub pool_id: u64,
    pub investors: usize,
}

impl GenesisBalance {
    /// Read bank balances from a genesis document. Other modules' state is ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Self>> {
        let genesis: Genesis = serde_json::from_reader(reader)
            .map_err(|e| StatsError::Decode(format!("genesis file: {e}")))?;
        Ok(genesis.app_state.bank.balances)
    }
}

/// Count, per roster pool, the accounts with a positive pool-coin balance.
/// Results follow roster order.
pub fn count_pool_investors(
    roster: &[PoolRosterEntry],
    balances: &[GenesisBalance],
) -> Vec<PoolInvestors> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for balance in balances {
        for pool in roster {
            let holds_shares = balance
                .coins
                .iter()
                .any(|coin| coin.denom == pool.pool_coin_denom && coin.is_positive());
            if holds_shares {
                *counts.entry(pool.id).or_default() += 1;
            }
        }
    }

    info!(
        accounts = balances.len(),
        pools = roster.len(),
        "Counted pool investors"
    );

    roster
        .iter()
        .map(|pool| PoolInvestors {
            pool_id: pool.id,
            investors: counts.get(&pool.id).copied().unwrap_or(0),
        })
        .collect()
}
