use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use stats_core::events::RawEvent;
use stats_core::types::{Coin, PoolRosterEntry};
use stats_core::{
    ChainClient, ClientConfig, QueryOptions, Result, SearchPage, StatsError, TransportFailure,
};
use stats_metrics::{counters, histograms};
use tracing::debug;

use crate::rest::{BalanceResponse, PoolsResponse};
use crate::retry::RetryPolicy;
use crate::rpc::{
    parse_height, BlockResult, BlockResultsResult, BlockSearchResult, RpcResponse, StatusResult,
};

/// Header carrying the height a gateway query is pinned to, echoed back by the node
pub const BLOCK_HEIGHT_HEADER: &str = "x-cosmos-block-height";

struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

/// Chain client over the Tendermint RPC and Cosmos REST HTTP endpoints
pub struct HttpChainClient {
    http: Client,
    config: ClientConfig,
    retry: RetryPolicy,
}

impl HttpChainClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StatsError::Config(format!("http client: {e}")))?;
        let retry = RetryPolicy::from_config(&config);
        Ok(Self {
            http,
            config,
            retry,
        })
    }

    async fn get(
        &self,
        endpoint: &str,
        url: &str,
        params: &[(&str, String)],
        token: Option<&str>,
        opts: QueryOptions,
    ) -> Result<RawResponse> {
        let mut request = self.http.get(url).query(params);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token);
        }
        if let Some(height) = opts.height {
            request = request.header(BLOCK_HEIGHT_HEADER, height.to_string());
        }

        counters::rpc_requests(endpoint);
        let started = Instant::now();
        let response = request.send().await.map_err(|e| transport_error(endpoint, &e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(endpoint, &e))?
            .to_vec();
        histograms::rpc_request_duration(started.elapsed(), endpoint);

        debug!(
            endpoint = endpoint,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Response received"
        );

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// Tendermint JSON-RPC call over URI
    async fn rpc<T: DeserializeOwned>(&self, endpoint: &'static str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{endpoint}", self.config.rpc_url);
        self.retry
            .run(endpoint, || async {
                let resp = self
                    .get(endpoint, &url, params, self.config.rpc_token.as_deref(), QueryOptions::latest())
                    .await?;
                // JSON-RPC errors come back with a 5xx status, so the envelope is checked first
                match serde_json::from_slice::<RpcResponse<T>>(&resp.body) {
                    Ok(envelope) if envelope.error.is_some() || resp.status.is_success() => {
                        envelope.into_result(endpoint)
                    }
                    Ok(_) => Err(http_error(endpoint, &resp)),
                    Err(_) if !resp.status.is_success() => Err(http_error(endpoint, &resp)),
                    Err(e) => Err(StatsError::Decode(format!("{endpoint}: {e}"))),
                }
            })
            .await
    }

    /// REST gateway query, optionally pinned to a height
    async fn rest<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &[(&str, String)],
        opts: QueryOptions,
    ) -> Result<T> {
        let url = format!("{}{path}", self.config.api_url);
        self.retry
            .run(endpoint, || async {
                let resp = self
                    .get(endpoint, &url, params, self.config.api_token.as_deref(), opts)
                    .await?;
                if !resp.status.is_success() {
                    return Err(http_error(endpoint, &resp));
                }
                if let Some(expected) = opts.height {
                    check_block_height(&resp.headers, expected)?;
                }
                serde_json::from_slice(&resp.body)
                    .map_err(|e| StatsError::Decode(format!("{endpoint}: {e}")))
            })
            .await
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn latest_height(&self) -> Result<u64> {
        let status: StatusResult = self.rpc("status", &[]).await?;
        parse_height("latest_block_height", &status.sync_info.latest_block_height)
    }

    async fn block_time(&self, height: u64) -> Result<DateTime<Utc>> {
        let block: BlockResult = self.rpc("block", &[("height", height.to_string())]).await?;
        block
            .block
            .header
            .time
            .ok_or_else(|| StatsError::Decode(format!("block {height}: header has no time")))
    }

    async fn search_heights(&self, query: &str, page: u32, per_page: u32) -> Result<SearchPage> {
        let params = [
            ("query", format!("\"{query}\"")),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
            ("order_by", "\"asc\"".to_string()),
        ];
        let result: BlockSearchResult = self.rpc("block_search", &params).await?;
        let heights = result
            .blocks
            .iter()
            .map(|b| parse_height("block height", &b.block.header.height))
            .collect::<Result<Vec<u64>>>()?;
        Ok(SearchPage {
            total_count: parse_height("total_count", &result.total_count)?,
            heights,
        })
    }

    async fn end_block_events(&self, height: u64) -> Result<Vec<RawEvent>> {
        let result: BlockResultsResult = self
            .rpc("block_results", &[("height", height.to_string())])
            .await?;
        let served = parse_height("block_results height", &result.height)?;
        if served != height {
            return Err(StatsError::HeightMismatch {
                expected: height,
                actual: served,
            });
        }
        result
            .end_block_events
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.into_raw(self.config.attribute_encoding))
            .collect()
    }

    async fn pools(&self, opts: QueryOptions) -> Result<Vec<PoolRosterEntry>> {
        let mut pools = Vec::new();
        let mut next_key: Option<String> = None;
        loop {
            let params: Vec<(&str, String)> = next_key
                .take()
                .map(|key| vec![("pagination.key", key)])
                .unwrap_or_default();
            let page: PoolsResponse = self
                .rest("pools", "/cosmos/liquidity/v1beta1/pools", &params, opts)
                .await?;
            next_key = page.next_key().map(str::to_string);
            for pool in page.pools {
                pools.push(PoolRosterEntry::try_from(pool)?);
            }
            if next_key.is_none() {
                break;
            }
        }
        debug!(pools = pools.len(), height = ?opts.height, "Fetched liquidity pools");
        Ok(pools)
    }

    async fn balance(&self, address: &str, denom: &str, opts: QueryOptions) -> Result<Coin> {
        let path = format!("/cosmos/bank/v1beta1/balances/{address}/by_denom");
        let resp: BalanceResponse = self
            .rest("balance", &path, &[("denom", denom.to_string())], opts)
            .await?;
        resp.into_coin(denom)
    }
}

/// The node must report serving exactly the pinned height
pub fn check_block_height(headers: &HeaderMap, expected: u64) -> Result<()> {
    let value = headers
        .get(BLOCK_HEIGHT_HEADER)
        .ok_or_else(|| StatsError::Decode("block height header not found".to_string()))?;
    let actual = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| StatsError::Decode(format!("block height header {value:?} is not a height")))?;
    if actual != expected {
        return Err(StatsError::HeightMismatch { expected, actual });
    }
    Ok(())
}

fn transport_error(endpoint: &str, e: &reqwest::Error) -> StatsError {
    let kind = if e.is_timeout() {
        TransportFailure::Timeout
    } else if e.is_connect() {
        TransportFailure::Connect
    } else {
        TransportFailure::Other
    };
    StatsError::Transport {
        endpoint: endpoint.to_string(),
        kind,
        message: e.to_string(),
    }
}

fn http_error(endpoint: &str, resp: &RawResponse) -> StatsError {
    let retry_after = resp
        .headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    StatsError::Http {
        endpoint: endpoint.to_string(),
        status: resp.status.as_u16(),
        retry_after,
        body: String::from_utf8_lossy(&resp.body).chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Reply = (u16, Vec<(&'static str, String)>, String);

    /// Serve canned HTTP/1.1 replies, recording each request target
    async fn serve<F>(route: F) -> (String, Arc<Mutex<Vec<String>>>)
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let route = Arc::new(route);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let route = Arc::clone(&route);
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&request).to_string();
                    let target = request.split_whitespace().nth(1).unwrap_or_default().to_string();
                    log.lock().unwrap().push(target.clone());

                    let (status, headers, body) = route(&target);
                    let mut reply = format!(
                        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n",
                        body.len()
                    );
                    for (name, value) in headers {
                        reply.push_str(&format!("{name}: {value}\r\n"));
                    }
                    reply.push_str("\r\n");
                    reply.push_str(&body);
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{addr}"), seen)
    }

    fn local_config(base: &str, attempts: u32) -> ClientConfig {
        ClientConfig {
            rpc_url: base.to_string(),
            rpc_token: None,
            api_url: base.to_string(),
            api_token: None,
            request_timeout: std::time::Duration::from_secs(5),
            retry_attempts: attempts,
            retry_delay_ms: 1,
            attribute_encoding: stats_core::AttributeEncoding::Plain,
        }
    }

    fn pools_page(target: &str) -> Reply {
        let (id, next_key) = if target.contains("pagination.key=") {
            ("2", "null")
        } else {
            ("1", "\"AAAAAAAAAAI=\"")
        };
        let body = format!(
            r#"{{"pools":[{{"id":"{id}","reserve_coin_denoms":["uatom","uusd"],"reserve_account_address":"cosmos1reserve{id}","pool_coin_denom":"pool{id}"}}],"pagination":{{"next_key":{next_key}}}}}"#
        );
        (200, vec![(BLOCK_HEIGHT_HEADER, "100".to_string())], body)
    }

    #[tokio::test]
    async fn test_pools_follow_next_key_across_pages() {
        let (base, seen) = serve(pools_page).await;
        let client = HttpChainClient::new(local_config(&base, 1)).unwrap();

        let pools = client.pools(QueryOptions::at_height(100)).await.unwrap();
        let ids: Vec<u64> = pools.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(pools[1].reserve_account_address, "cosmos1reserve2");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(!seen[0].contains("pagination.key="));
        assert!(seen[1].contains("pagination.key="), "{}", seen[1]);
    }

    #[tokio::test]
    async fn test_pinned_pools_reject_other_height() {
        let (base, _) = serve(pools_page).await;
        let client = HttpChainClient::new(local_config(&base, 1)).unwrap();

        let err = client.pools(QueryOptions::at_height(99)).await.unwrap_err();
        assert!(matches!(
            err,
            StatsError::HeightMismatch {
                expected: 99,
                actual: 100
            }
        ));
    }

    #[tokio::test]
    async fn test_block_results_height_checked() {
        let (base, _) = serve(|target| {
            let body = if target.contains("height=7") {
                r#"{"jsonrpc":"2.0","id":-1,"result":{"height":"8","end_block_events":null}}"#
            } else {
                r#"{"jsonrpc":"2.0","id":-1,"result":{"height":"9","end_block_events":[
                    {"type":"swap_transacted","attributes":[{"key":"pool_id","value":"1"}]}
                ]}}"#
            };
            (200, Vec::new(), body.to_string())
        })
        .await;
        let client = HttpChainClient::new(local_config(&base, 1)).unwrap();

        let err = client.end_block_events(7).await.unwrap_err();
        assert!(matches!(
            err,
            StatsError::HeightMismatch {
                expected: 7,
                actual: 8
            }
        ));

        let events = client.end_block_events(9).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].attributes["pool_id"], "1");
    }

    #[tokio::test]
    async fn test_client_errors_fail_without_retry() {
        let (base, seen) =
            serve(|_| (404, Vec::new(), "connection timeout upstream".to_string())).await;
        let client = HttpChainClient::new(local_config(&base, 3)).unwrap();

        let err = client.pools(QueryOptions::latest()).await.unwrap_err();
        assert!(matches!(err, StatsError::Http { status: 404, .. }));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_retried() {
        let (base, seen) = serve(|_| (503, Vec::new(), String::new())).await;
        let client = HttpChainClient::new(local_config(&base, 3)).unwrap();

        let err = client.latest_height().await.unwrap_err();
        assert!(matches!(err, StatsError::Http { status: 503, .. }));
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert(BLOCK_HEIGHT_HEADER, HeaderValue::from_str(v).unwrap());
        }
        headers
    }

    #[test]
    fn test_check_block_height() {
        assert!(check_block_height(&headers(Some("6910000")), 6_910_000).is_ok());
        assert!(matches!(
            check_block_height(&headers(Some("6910001")), 6_910_000),
            Err(StatsError::HeightMismatch {
                expected: 6_910_000,
                actual: 6_910_001
            })
        ));
        assert!(matches!(
            check_block_height(&headers(None), 1),
            Err(StatsError::Decode(_))
        ));
        assert!(matches!(
            check_block_height(&headers(Some("latest")), 1),
            Err(StatsError::Decode(_))
        ));
    }

    #[test]
    fn test_http_error_carries_retry_hint() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        let resp = RawResponse {
            status: StatusCode::TOO_MANY_REQUESTS,
            headers,
            body: b"slow down".to_vec(),
        };
        let err = http_error("status", &resp);
        assert_eq!(err.to_string(), "status: HTTP 429: slow down");
        assert!(matches!(
            err,
            StatsError::Http {
                status: 429,
                retry_after: Some(7),
                ..
            }
        ));
        assert!(crate::retry::is_retryable_error(&err));
    }

    #[test]
    fn test_client_error_body_does_not_trigger_retry() {
        let resp = RawResponse {
            status: StatusCode::BAD_REQUEST,
            headers: HeaderMap::new(),
            body: b"connection timeout while parsing height".to_vec(),
        };
        assert!(!crate::retry::is_retryable_error(&http_error("block", &resp)));
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = ClientConfig {
            rpc_url: "http://localhost:26657".to_string(),
            rpc_token: None,
            api_url: "http://localhost:1317".to_string(),
            api_token: Some("token".to_string()),
            request_timeout: std::time::Duration::from_secs(5),
            retry_attempts: 0,
            retry_delay_ms: 10,
            attribute_encoding: stats_core::AttributeEncoding::Plain,
        };
        let client = HttpChainClient::new(config).unwrap();
        assert_eq!(client.retry.attempts, 1);
    }
}
