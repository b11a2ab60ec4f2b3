//! HTTP implementation of [`stats_core::ChainClient`]
//!
//! Chain head, block times, block search and end-block events come from the
//! Tendermint RPC; pools and balances from the Cosmos REST gateway, optionally
//! pinned to a height.

pub mod client;
pub mod rest;
pub mod retry;
pub mod rpc;

pub use client::{HttpChainClient, BLOCK_HEIGHT_HEADER};
pub use retry::{is_retryable_error, RetryPolicy};
