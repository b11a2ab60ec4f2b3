pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use client::{ChainClient, QueryOptions, SearchPage};
pub use config::{AttributeEncoding, ClientConfig, ScanConfig, StatsConfig};
pub use error::{Result, StatsError, TransportFailure};
