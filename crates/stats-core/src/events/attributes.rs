use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use super::RawEvent;
use crate::error::{Result, StatsError};
use crate::types::{parse_amount, parse_dec_amount, Coin, DecCoin};

impl RawEvent {
    /// Raw value of a required attribute
    pub fn attr(&self, key: &str) -> Result<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| StatsError::MissingAttribute {
                key: key.to_string(),
            })
    }

    pub fn u64_attr(&self, key: &str) -> Result<u64> {
        let value = self.attr(key)?;
        value.parse::<u64>().map_err(|e| malformed(key, value, e.to_string()))
    }

    pub fn int_attr(&self, key: &str) -> Result<BigInt> {
        let value = self.attr(key)?;
        parse_amount(value).map_err(|reason| malformed(key, value, reason))
    }

    pub fn dec_attr(&self, key: &str) -> Result<BigDecimal> {
        let value = self.attr(key)?;
        parse_dec_amount(value).map_err(|reason| malformed(key, value, reason))
    }

    /// Coin built from a denom attribute and an integer amount attribute
    pub fn coin_attrs(&self, denom_key: &str, amount_key: &str) -> Result<Coin> {
        let denom = self.attr(denom_key)?;
        let amount = self.int_attr(amount_key)?;
        Ok(Coin::new(denom, amount))
    }

    /// Coin built from a denom attribute and a decimal amount attribute
    pub fn dec_coin_attrs(&self, denom_key: &str, amount_key: &str) -> Result<DecCoin> {
        let denom = self.attr(denom_key)?;
        let amount = self.dec_attr(amount_key)?;
        Ok(DecCoin::new(denom, amount))
    }
}

fn malformed(key: &str, value: &str, reason: String) -> StatsError {
    StatsError::MalformedNumber {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}
