//! In-memory chain used by the sync tests

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use num_bigint::BigInt;
use stats_core::events::RawEvent;
use stats_core::types::{Coin, PoolRosterEntry};
use stats_core::{ChainClient, QueryOptions, Result, SearchPage, StatsError};

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

pub fn coin(denom: &str, amount: i64) -> Coin {
    Coin::new(denom, BigInt::from(amount))
}

pub fn pool(id: u64, x: &str, y: &str) -> PoolRosterEntry {
    PoolRosterEntry {
        id,
        reserve_coin_denoms: [x.to_string(), y.to_string()],
        reserve_account_address: format!("cosmos1reserve{id}"),
        pool_coin_denom: format!("pool{id}"),
    }
}

pub fn swap_event(pool_id: u64, requester: &str, offer: (&str, u64), demand: (&str, u64)) -> RawEvent {
    RawEvent::from_pairs(
        "swap_transacted",
        [
            ("pool_id", pool_id.to_string()),
            ("success", "success".to_string()),
            ("swap_requester", requester.to_string()),
            ("offer_coin_denom", offer.0.to_string()),
            ("exchanged_offer_coin_amount", offer.1.to_string()),
            ("demand_coin_denom", demand.0.to_string()),
            ("exchanged_demand_coin_amount", demand.1.to_string()),
            ("offer_coin_fee_amount", "3".to_string()),
            ("exchanged_coin_fee_amount", "2.5".to_string()),
        ],
    )
}

pub fn failed_swap_event(pool_id: u64, requester: &str, offer: (&str, u64)) -> RawEvent {
    RawEvent::from_pairs(
        "swap_transacted",
        [
            ("pool_id", pool_id.to_string()),
            ("success", "failure".to_string()),
            ("swap_requester", requester.to_string()),
            ("offer_coin_denom", offer.0.to_string()),
            ("exchanged_offer_coin_amount", offer.1.to_string()),
        ],
    )
}

#[derive(Default)]
pub struct FakeChain {
    pub latest: u64,
    pub block_times: BTreeMap<u64, DateTime<Utc>>,
    /// Heights returned by block search, already ascending
    pub search_results: Vec<u64>,
    pub fail_page: Option<u32>,
    pub events: BTreeMap<u64, Vec<RawEvent>>,
    pub failing_heights: BTreeSet<u64>,
    pub pools: Vec<PoolRosterEntry>,
    pub balances: BTreeMap<(String, String), BigInt>,

    pub block_time_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub event_calls: AtomicUsize,
    pub last_query: std::sync::Mutex<Option<String>>,
    pub pinned_heights: std::sync::Mutex<Vec<Option<u64>>>,
}

impl FakeChain {
    pub fn new(latest: u64) -> Self {
        Self {
            latest,
            ..Default::default()
        }
    }

    pub fn with_pool(mut self, pool: PoolRosterEntry, reserves: [i64; 2]) -> Self {
        for (denom, amount) in pool.reserve_coin_denoms.iter().zip(reserves) {
            self.balances.insert(
                (pool.reserve_account_address.clone(), denom.clone()),
                BigInt::from(amount),
            );
        }
        self.pools.push(pool);
        self
    }

    pub fn with_events(mut self, height: u64, events: Vec<RawEvent>) -> Self {
        self.search_results.push(height);
        self.events.insert(height, events);
        self
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn latest_height(&self) -> Result<u64> {
        Ok(self.latest)
    }

    async fn block_time(&self, height: u64) -> Result<DateTime<Utc>> {
        self.block_time_calls.fetch_add(1, Ordering::SeqCst);
        self.block_times
            .get(&height)
            .copied()
            .ok_or_else(|| StatsError::Rpc(format!("no block at height {height}")))
    }

    async fn search_heights(&self, query: &str, page: u32, per_page: u32) -> Result<SearchPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());
        if self.fail_page == Some(page) {
            return Err(StatsError::Rpc("connection reset".to_string()));
        }
        let heights = &self.search_results;
        let start = ((page - 1) * per_page) as usize;
        let end = (start + per_page as usize).min(heights.len());
        Ok(SearchPage {
            total_count: heights.len() as u64,
            heights: heights.get(start..end).map(<[u64]>::to_vec).unwrap_or_default(),
        })
    }

    async fn end_block_events(&self, height: u64) -> Result<Vec<RawEvent>> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_heights.contains(&height) {
            return Err(StatsError::Rpc(format!("block_results {height} failed")));
        }
        Ok(self.events.get(&height).cloned().unwrap_or_default())
    }

    async fn pools(&self, opts: QueryOptions) -> Result<Vec<PoolRosterEntry>> {
        self.pinned_heights.lock().unwrap().push(opts.height);
        Ok(self.pools.clone())
    }

    async fn balance(&self, address: &str, denom: &str, opts: QueryOptions) -> Result<Coin> {
        self.pinned_heights.lock().unwrap().push(opts.height);
        let amount = self
            .balances
            .get(&(address.to_string(), denom.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(Coin::new(denom, amount))
    }
}
