pub mod aggregation;
pub mod genesis;

pub use aggregation::{AggregationState, FoldStats};
pub use genesis::{count_pool_investors, GenesisBalance, PoolInvestors};
