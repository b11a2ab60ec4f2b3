use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Largest integer amount accepted, in bits (chain `Int` bound)
pub const MAX_INT_BITS: u64 = 256;

/// Maximum fractional digits of a chain `Dec`
pub const MAX_DEC_PRECISION: usize = 18;

/// Whole-unit amount of a single denomination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: BigInt,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: BigInt) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, BigInt::zero())
    }

    pub fn is_positive(&self) -> bool {
        self.amount.is_positive()
    }

    /// Add `other` in place. Both coins must carry the same denom.
    pub fn checked_add_assign(&mut self, other: &Coin) -> Result<()> {
        if self.denom != other.denom {
            return Err(StatsError::DenomMismatch {
                expected: self.denom.clone(),
                actual: other.denom.clone(),
            });
        }
        self.amount += &other.amount;
        Ok(())
    }
}

/// Fractional amount of a single denomination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecCoin {
    pub denom: String,
    pub amount: BigDecimal,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Round the amount up to the next whole unit, then truncate to an integer coin.
    pub fn ceil(&self) -> Coin {
        // with_scale(0) truncates toward zero, which is already the ceiling for negatives
        let (mut whole, _) = self.amount.with_scale(0).into_bigint_and_exponent();
        if self.amount > BigDecimal::new(whole.clone(), 0) {
            whole += BigInt::one();
        }
        Coin::new(self.denom.clone(), whole)
    }
}

/// Parse a base-10 integer amount.
pub fn parse_amount(s: &str) -> std::result::Result<BigInt, String> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("not an integer".to_string());
    }
    let value = BigInt::from_str(s).map_err(|e| e.to_string())?;
    if value.bits() > MAX_INT_BITS {
        return Err(format!("integer exceeds {MAX_INT_BITS} bits"));
    }
    Ok(value)
}

/// Parse a decimal amount with at most [`MAX_DEC_PRECISION`] fractional digits.
pub fn parse_dec_amount(s: &str) -> std::result::Result<BigDecimal, String> {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err("not a decimal".to_string());
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err("not a decimal".to_string());
        }
        if frac.len() > MAX_DEC_PRECISION {
            return Err(format!(
                "too many decimal places: {} > {MAX_DEC_PRECISION}",
                frac.len()
            ));
        }
    }
    BigDecimal::from_str(s).map_err(|e| e.to_string())
}

mod amount_string {
    use super::parse_amount;
    use num_bigint::BigInt;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_amount(&s).map_err(de::Error::custom)
    }
}
