use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Missing attribute: {key}")]
    MissingAttribute { key: String },

    #[error("Malformed number in attribute {key}: {value:?} ({reason})")]
    MalformedNumber {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Block time unavailable at height {height}: {reason}")]
    OracleUnavailable { height: u64, reason: String },

    #[error("Block search page {page} failed: {reason}")]
    PageFetchFailed { page: u32, reason: String },

    #[error("Pool not found: {0}")]
    UnknownPool(u64),

    #[error("Block height mismatch: expected {expected}, got {actual}")]
    HeightMismatch { expected: u64, actual: u64 },

    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("Denom mismatch: expected {expected}, got {actual}")]
    DenomMismatch { expected: String, actual: String },

    #[error("Duplicate pool in roster: {0}")]
    DuplicatePool(u64),

    #[error("Missing reserve snapshot for pool {0}")]
    MissingReserve(u64),

    #[error("Invalid height range: begin {begin} > end {end}")]
    InvalidRange { begin: u64, end: u64 },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("{endpoint}: HTTP {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        /// Seconds from a `Retry-After` header
        retry_after: Option<u64>,
        body: String,
    },

    #[error("{endpoint}: {kind}: {message}")]
    Transport {
        endpoint: String,
        kind: TransportFailure,
        message: String,
    },

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a request failed before any HTTP status was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Connect,
    Other,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportFailure::Timeout => "request timeout",
            TransportFailure::Connect => "connection error",
            TransportFailure::Other => "request error",
        };
        f.write_str(s)
    }
}

impl StatsError {
    /// Errors raised by external cancellation rather than by the data
    pub fn is_aborted(&self) -> bool {
        matches!(self, StatsError::Aborted(_))
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
