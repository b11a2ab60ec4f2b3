//! Cosmos REST gateway response bodies

use serde::Deserialize;
use stats_core::types::{Coin, PoolRosterEntry};
use stats_core::{Result, StatsError};

#[derive(Debug, Deserialize)]
pub struct PoolsResponse {
    #[serde(default)]
    pub pools: Vec<RestPool>,
    #[serde(default)]
    pub pagination: Option<PageResponse>,
}

impl PoolsResponse {
    /// Key for the next page, if any
    pub fn next_key(&self) -> Option<&str> {
        self.pagination
            .as_ref()
            .and_then(|p| p.next_key.as_deref())
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub next_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestPool {
    pub id: String,
    pub reserve_coin_denoms: Vec<String>,
    pub reserve_account_address: String,
    pub pool_coin_denom: String,
}

impl TryFrom<RestPool> for PoolRosterEntry {
    type Error = StatsError;

    fn try_from(pool: RestPool) -> Result<Self> {
        let id = pool
            .id
            .parse()
            .map_err(|e| StatsError::Decode(format!("pool id {:?}: {e}", pool.id)))?;
        let reserve_coin_denoms: [String; 2] =
            pool.reserve_coin_denoms.try_into().map_err(|denoms: Vec<String>| {
                StatsError::Decode(format!(
                    "pool {id} has {} reserve denoms, expected 2",
                    denoms.len()
                ))
            })?;
        Ok(PoolRosterEntry {
            id,
            reserve_coin_denoms,
            reserve_account_address: pool.reserve_account_address,
            pool_coin_denom: pool.pool_coin_denom,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceResponse {
    #[serde(default)]
    pub balance: Option<Coin>,
}

impl BalanceResponse {
    /// Balance of `denom`; an absent balance is zero
    pub fn into_coin(self, denom: &str) -> Result<Coin> {
        match self.balance {
            Some(coin) if coin.denom == denom => Ok(coin),
            Some(coin) => Err(StatsError::DenomMismatch {
                expected: denom.to_string(),
                actual: coin.denom,
            }),
            None => Ok(Coin::zero(denom)),
        }
    }
}
