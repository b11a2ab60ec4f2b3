use std::future::Future;
use std::time::Duration;

use regex::Regex;
use stats_core::{ClientConfig, Result, StatsError, TransportFailure};
use tracing::{error, info, warn};

/// Exponential backoff for transient transport failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            initial_delay: Duration::from_millis(config.retry_delay_ms),
            ..Self::default()
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// runs out of attempts.
    pub async fn run<T, F, Fut>(&self, endpoint: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0u32;
        let mut delay = self.initial_delay;

        loop {
            attempts += 1;
            match op().await {
                Ok(value) => {
                    if attempts > 1 {
                        info!(endpoint = endpoint, attempts = attempts, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempts < self.attempts && is_retryable_error(&e) => {
                    // honour a server-provided wait when it is longer than our backoff
                    let wait = retry_hint_seconds(&e)
                        .map(Duration::from_secs)
                        .map_or(delay, |hint| hint.max(delay))
                        .min(self.max_delay);

                    warn!(
                        endpoint = endpoint,
                        attempt = attempts,
                        max_attempts = self.attempts,
                        delay_ms = wait.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying with backoff"
                    );

                    tokio::time::sleep(wait).await;
                    delay = (delay * 2).min(self.max_delay);
                }
                Err(e) => {
                    error!(endpoint = endpoint, attempts = attempts, error = %e, "Request failed");
                    return Err(e);
                }
            }
        }
    }
}

/// Failures worth another attempt: rate limits (429), 5xx responses,
/// timeouts and dropped connections. Everything else is final, including
/// JSON-RPC error envelopes.
pub fn is_retryable_error(error: &StatsError) -> bool {
    match error {
        StatsError::Http { status, .. } => {
            *status == 429 || (500..=599).contains(status)
        }
        StatsError::Transport {
            kind: TransportFailure::Timeout | TransportFailure::Connect,
            ..
        } => true,
        StatsError::Transport { message, .. } => is_connection_error(&message.to_lowercase()),
        _ => false,
    }
}

fn is_connection_error(msg: &str) -> bool {
    msg.contains("timed out")
        || msg.contains("connection closed")
        || msg.contains("connection reset")
        || msg.contains("eof")
        || msg.contains("broken pipe")
        || msg.contains("reset by peer")
        || msg.contains("error sending request")
}

/// Server-requested wait: the `Retry-After` header, or for a 429 without
/// one, a hint in the response body
fn retry_hint_seconds(error: &StatsError) -> Option<u64> {
    match error {
        StatsError::Http {
            retry_after: Some(secs),
            ..
        } => Some((*secs).max(1)),
        StatsError::Http {
            status: 429, body, ..
        } => parse_retry_seconds(&body.to_lowercase()),
        _ => None,
    }
}

/// Parse a wait hint like "retry after 30 seconds" or "wait 5s"
fn parse_retry_seconds(msg: &str) -> Option<u64> {
    let patterns = [
        r"retry.{0,10}?(\d+)\s*(?:second|sec|s\b)",
        r"wait.{0,10}?(\d+)\s*(?:second|sec|s\b)",
        r"after\s+(\d+)\s*(?:second|sec|s\b)",
    ];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(secs) = re
                .captures(msg)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
            {
                return Some(secs.max(1));
            }
        }
    }
    None
}
