mod coin;
mod pool;
mod range;
mod summary;

pub use coin::{parse_amount, parse_dec_amount, Coin, DecCoin, MAX_DEC_PRECISION, MAX_INT_BITS};
pub use pool::PoolRosterEntry;
pub use range::HeightRange;
pub use summary::{PoolSummary, ReserveSnapshot, SwapSummary};
