//! Raw chain events and their typed projections
//!
//! End-block events arrive as an event type plus an unordered bag of string
//! attributes. [`RawEvent`] holds that bag and exposes typed accessors
//! (see `attributes`); [`SwapTransacted`] is the validated projection of a
//! `swap_transacted` event, decoded exactly once.

mod attributes;
mod swap;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use swap::{decode_swaps, BlockSwaps, SwapFill, SwapTransacted};

/// Event type emitted by the liquidity module for every executed swap order
pub const EVENT_TYPE_SWAP_TRANSACTED: &str = "swap_transacted";

/// Value of the `success` attribute for a filled swap
pub const SWAP_STATUS_SUCCESS: &str = "success";

/// Attribute keys of liquidity-module events
pub mod keys {
    pub const POOL_ID: &str = "pool_id";
    pub const SUCCESS: &str = "success";
    pub const SWAP_REQUESTER: &str = "swap_requester";
    pub const OFFER_COIN_DENOM: &str = "offer_coin_denom";
    pub const DEMAND_COIN_DENOM: &str = "demand_coin_denom";
    pub const EXCHANGED_OFFER_COIN_AMOUNT: &str = "exchanged_offer_coin_amount";
    pub const EXCHANGED_DEMAND_COIN_AMOUNT: &str = "exchanged_demand_coin_amount";
    pub const OFFER_COIN_FEE_AMOUNT: &str = "offer_coin_fee_amount";
    pub const EXCHANGED_COIN_FEE_AMOUNT: &str = "exchanged_coin_fee_amount";
}

/// An event as returned by the chain: type tag plus attribute bag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: BTreeMap<String, String>,
}

impl RawEvent {
    /// Build from key/value pairs. A repeated key keeps its last value.
    pub fn from_pairs<K, V>(kind: impl Into<String>, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind: kind.into(),
            attributes: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn is_swap_transacted(&self) -> bool {
        self.kind == EVENT_TYPE_SWAP_TRANSACTED
    }
}
