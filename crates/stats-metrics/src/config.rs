use std::net::SocketAddr;

use crate::{MetricsError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Exporter bind host
    pub host: String,
    /// Exporter port; the exporter is disabled when unset
    pub port: Option<u16>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
        }
    }
}

impl MetricsConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("METRICS_HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(default_host);
        let port = match lookup("METRICS_PORT").map(|p| p.trim().to_string()) {
            Some(p) if !p.is_empty() => Some(p.parse::<u16>().map_err(|e| {
                MetricsError::Config(format!("METRICS_PORT={p:?}: {e}"))
            })?),
            _ => None,
        };
        Ok(Self { host, port })
    }

    pub fn is_enabled(&self) -> bool {
        self.port.is_some()
    }

    pub fn socket_addr(&self) -> Result<Option<SocketAddr>> {
        let Some(port) = self.port else {
            return Ok(None);
        };
        format!("{}:{}", self.host, port)
            .parse()
            .map(Some)
            .map_err(|e| MetricsError::Config(format!("METRICS_HOST={:?}: {e}", self.host)))
    }
}
