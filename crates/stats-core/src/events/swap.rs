use serde::Serialize;

use super::{keys, RawEvent, SWAP_STATUS_SUCCESS};
use crate::error::Result;
use crate::types::Coin;

/// Fields only a filled swap carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapFill {
    pub demand_coin: Coin,
    pub offer_coin_fee: Coin,
    /// Exchanged fee rounded up to a whole unit of the demand denom
    pub demand_coin_fee: Coin,
}

/// A decoded `swap_transacted` event.
///
/// A failed swap has no `fill`, so demand-side amounts cannot be read for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapTransacted {
    pub pool_id: u64,
    pub swap_requester: String,
    pub offer_coin: Coin,
    pub fill: Option<SwapFill>,
}

impl SwapTransacted {
    pub fn decode(event: &RawEvent) -> Result<Self> {
        // any status other than the success value is a failed swap
        let success = event.attr(keys::SUCCESS)? == SWAP_STATUS_SUCCESS;

        let pool_id = event.u64_attr(keys::POOL_ID)?;
        let swap_requester = event.attr(keys::SWAP_REQUESTER)?.to_string();
        let offer_coin =
            event.coin_attrs(keys::OFFER_COIN_DENOM, keys::EXCHANGED_OFFER_COIN_AMOUNT)?;

        let fill = if success {
            let demand_coin =
                event.coin_attrs(keys::DEMAND_COIN_DENOM, keys::EXCHANGED_DEMAND_COIN_AMOUNT)?;
            let offer_coin_fee =
                event.coin_attrs(keys::OFFER_COIN_DENOM, keys::OFFER_COIN_FEE_AMOUNT)?;
            let demand_coin_fee = event
                .dec_coin_attrs(keys::DEMAND_COIN_DENOM, keys::EXCHANGED_COIN_FEE_AMOUNT)?
                .ceil();
            Some(SwapFill {
                demand_coin,
                offer_coin_fee,
                demand_coin_fee,
            })
        } else {
            None
        };

        Ok(Self {
            pool_id,
            swap_requester,
            offer_coin,
            fill,
        })
    }

    pub fn is_success(&self) -> bool {
        self.fill.is_some()
    }
}

/// Decoded swaps of one block, in event order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSwaps {
    pub height: u64,
    pub events: Vec<SwapTransacted>,
}

/// Decode every `swap_transacted` event, skipping other event types.
/// The first undecodable swap fails the whole block.
pub fn decode_swaps(events: &[RawEvent]) -> Result<Vec<SwapTransacted>> {
    events
        .iter()
        .filter(|e| e.is_swap_transacted())
        .map(SwapTransacted::decode)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatsError;
    use num_bigint::BigInt;

    fn swap_event(success: &str) -> RawEvent {
        RawEvent::from_pairs(
            "swap_transacted",
            [
                ("pool_id", "1"),
                ("success", success),
                ("swap_requester", "cosmos1requester"),
                ("offer_coin_denom", "uatom"),
                ("exchanged_offer_coin_amount", "1000000"),
                ("demand_coin_denom", "uusd"),
                ("exchanged_demand_coin_amount", "950000"),
                ("offer_coin_fee_amount", "300"),
                ("exchanged_coin_fee_amount", "0.45"),
            ],
        )
    }

    #[test]
    fn test_decode_successful_swap() {
        let swap = SwapTransacted::decode(&swap_event("success")).unwrap();
        assert_eq!(swap.pool_id, 1);
        assert_eq!(swap.swap_requester, "cosmos1requester");
        assert_eq!(swap.offer_coin, Coin::new("uatom", BigInt::from(1_000_000)));

        let fill = swap.fill.expect("filled swap");
        assert_eq!(fill.demand_coin, Coin::new("uusd", BigInt::from(950_000)));
        assert_eq!(fill.offer_coin_fee, Coin::new("uatom", BigInt::from(300)));
        assert_eq!(fill.demand_coin_fee, Coin::new("uusd", BigInt::from(1)));
    }

    #[test]
    fn test_decode_failed_swap_only_offer() {
        let swap = SwapTransacted::decode(&swap_event("failure")).unwrap();
        assert!(!swap.is_success());
        assert!(swap.fill.is_none());
        assert_eq!(swap.offer_coin, Coin::new("uatom", BigInt::from(1_000_000)));
    }

    #[test]
    fn test_failed_swap_ignores_demand_attributes() {
        let mut event = swap_event("failure");
        event.attributes.remove("demand_coin_denom");
        event
            .attributes
            .insert("exchanged_coin_fee_amount".into(), "garbage".into());
        assert!(SwapTransacted::decode(&event).is_ok());
    }

    #[test]
    fn test_missing_success_attribute_fails_decode() {
        let mut event = swap_event("success");
        event.attributes.remove("success");
        assert!(matches!(
            SwapTransacted::decode(&event),
            Err(StatsError::MissingAttribute { key }) if key == "success"
        ));

        let unknown = SwapTransacted::decode(&swap_event("pending")).unwrap();
        assert!(!unknown.is_success());
    }

    #[test]
    fn test_successful_swap_requires_fill_attributes() {
        let mut event = swap_event("success");
        event.attributes.remove("exchanged_demand_coin_amount");
        assert!(matches!(
            SwapTransacted::decode(&event),
            Err(StatsError::MissingAttribute { key }) if key == "exchanged_demand_coin_amount"
        ));

        let mut event = swap_event("success");
        event
            .attributes
            .insert("exchanged_coin_fee_amount".into(), "1e3".into());
        assert!(matches!(
            SwapTransacted::decode(&event),
            Err(StatsError::MalformedNumber { .. })
        ));
    }

    #[test]
    fn test_offer_coin_required_regardless_of_success() {
        let mut event = swap_event("failure");
        event.attributes.remove("exchanged_offer_coin_amount");
        assert!(matches!(
            SwapTransacted::decode(&event),
            Err(StatsError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_demand_fee_rounds_up() {
        for (raw, expected) in [("0", 0), ("1", 1), ("1.000000000000000001", 2), ("41.5", 42)] {
            let mut event = swap_event("success");
            event
                .attributes
                .insert("exchanged_coin_fee_amount".into(), raw.into());
            let fill = SwapTransacted::decode(&event).unwrap().fill.unwrap();
            assert_eq!(fill.demand_coin_fee.amount, BigInt::from(expected), "{raw}");
        }
    }

    #[test]
    fn test_decode_swaps_filters_event_types() {
        let events = vec![
            RawEvent::from_pairs("transfer", [("amount", "1uatom")]),
            swap_event("success"),
            swap_event("failure"),
        ];
        let swaps = decode_swaps(&events).unwrap();
        assert_eq!(swaps.len(), 2);
        assert!(swaps[0].is_success());
        assert!(!swaps[1].is_success());
    }
}
