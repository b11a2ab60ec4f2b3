use crate::error::{Result, StatsError};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound the Tendermint `block_search` endpoint accepts for `per_page`
pub const MAX_SEARCH_PAGE_SIZE: u32 = 100;

/// How `end_block_events` attribute keys and values arrive on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeEncoding {
    /// Tendermint 0.34 base64-encodes both keys and values
    #[default]
    Base64,
    Plain,
}

impl FromStr for AttributeEncoding {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "base64" => Ok(Self::Base64),
            "plain" => Ok(Self::Plain),
            other => Err(StatsError::Config(format!(
                "ATTRIBUTE_ENCODING must be base64 or plain, got {other:?}"
            ))),
        }
    }
}

/// Transport settings for the chain client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub rpc_token: Option<String>,
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub attribute_encoding: AttributeEncoding,
}

/// Settings for height resolution and block scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Lowest height the resolver may return; blocks below it are not served
    pub floor_anchor_height: u64,
    pub search_page_size: u32,
    /// Number of heights fetched in flight at once
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            floor_anchor_height: 1,
            search_page_size: MAX_SEARCH_PAGE_SIZE,
            concurrency: 1,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if self.floor_anchor_height == 0 {
            return Err(StatsError::Config(
                "FLOOR_ANCHOR_HEIGHT must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_SEARCH_PAGE_SIZE).contains(&self.search_page_size) {
            return Err(StatsError::Config(format!(
                "SEARCH_PAGE_SIZE must be within 1..={MAX_SEARCH_PAGE_SIZE}, got {}",
                self.search_page_size
            )));
        }
        if self.concurrency == 0 {
            return Err(StatsError::Config(
                "SCAN_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub client: ClientConfig,
    pub scan: ScanConfig,
    /// Whole-run deadline; unset means no deadline
    pub run_timeout: Option<Duration>,
}

impl StatsConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(sanitize_url)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StatsError::MissingEnvVar(key.to_string()))
        };
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let client = ClientConfig {
            rpc_url: required("RPC_URL")?,
            rpc_token: optional("RPC_TOKEN"),
            api_url: required("API_URL")?,
            api_token: optional("API_TOKEN"),
            request_timeout: Duration::from_secs(parse_env(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            retry_attempts: parse_env(&lookup, "SYNC_RETRY_ATTEMPTS", 5)?,
            retry_delay_ms: parse_env(&lookup, "SYNC_RETRY_DELAY_MS", 500)?,
            attribute_encoding: parse_env(&lookup, "ATTRIBUTE_ENCODING", AttributeEncoding::Base64)?,
        };

        let scan = ScanConfig {
            floor_anchor_height: parse_env(&lookup, "FLOOR_ANCHOR_HEIGHT", 1)?,
            search_page_size: parse_env(&lookup, "SEARCH_PAGE_SIZE", MAX_SEARCH_PAGE_SIZE)?,
            concurrency: parse_env(&lookup, "SCAN_CONCURRENCY", 1)?,
        };
        scan.validate()?;

        let run_timeout = match optional("RUN_TIMEOUT_SECS") {
            Some(_) => Some(Duration::from_secs(parse_env(&lookup, "RUN_TIMEOUT_SECS", 0)?)),
            None => None,
        };

        Ok(Self {
            client,
            scan,
            run_timeout,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
/// A present but unparsable value is an error.
fn parse_env<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|e| StatsError::Config(format!("{key}={raw:?}: {e}"))),
        None => Ok(default),
    }
}

/// Remove surrounding quotes, whitespace and trailing slashes
fn sanitize_url(url: String) -> String {
    let trimmed = url.trim();
    let without_quotes = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    without_quotes.trim_end_matches('/').to_string()
}
