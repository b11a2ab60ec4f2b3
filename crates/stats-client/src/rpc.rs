//! Tendermint RPC response bodies

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use stats_core::events::RawEvent;
use stats_core::{AttributeEncoding, Result, StatsError};

/// JSON-RPC envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl<T> RpcResponse<T> {
    pub fn into_result(self, endpoint: &str) -> Result<T> {
        if let Some(err) = self.error {
            let detail = err.data.map(|d| format!(": {d}")).unwrap_or_default();
            return Err(StatsError::Rpc(format!(
                "{endpoint}: rpc error {}: {}{detail}",
                err.code, err.message
            )));
        }
        self.result
            .ok_or_else(|| StatsError::Decode(format!("{endpoint}: response has no result")))
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusResult {
    pub sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
pub struct SyncInfo {
    pub latest_block_height: String,
}

#[derive(Debug, Deserialize)]
pub struct BlockResult {
    pub block: Block,
}

#[derive(Debug, Deserialize)]
pub struct Block {
    pub header: Header,
}

#[derive(Debug, Deserialize)]
pub struct Header {
    pub height: String,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct BlockSearchResult {
    #[serde(default)]
    pub blocks: Vec<BlockResult>,
    pub total_count: String,
}

#[derive(Debug, Deserialize)]
pub struct BlockResultsResult {
    pub height: String,
    #[serde(default)]
    pub end_block_events: Option<Vec<AbciEvent>>,
}

#[derive(Debug, Deserialize)]
pub struct AbciEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<AbciAttribute>,
}

#[derive(Debug, Deserialize)]
pub struct AbciAttribute {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl AbciEvent {
    pub fn into_raw(self, encoding: AttributeEncoding) -> Result<RawEvent> {
        let pairs = self
            .attributes
            .into_iter()
            .map(|attr| {
                let key = decode_attribute(attr.key.unwrap_or_default(), encoding)?;
                let value = decode_attribute(attr.value.unwrap_or_default(), encoding)?;
                Ok((key, value))
            })
            .collect::<Result<Vec<(String, String)>>>()?;
        Ok(RawEvent::from_pairs(self.kind, pairs))
    }
}

fn decode_attribute(raw: String, encoding: AttributeEncoding) -> Result<String> {
    match encoding {
        AttributeEncoding::Plain => Ok(raw),
        AttributeEncoding::Base64 => {
            let bytes = STANDARD
                .decode(raw.as_bytes())
                .map_err(|e| StatsError::Decode(format!("attribute {raw:?}: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|e| StatsError::Decode(format!("attribute {raw:?}: {e}")))
        }
    }
}

/// Parse a decimal string field such as `"latest_block_height": "123"`
pub fn parse_height(field: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|e| StatsError::Decode(format!("{field} {value:?}: {e}")))
}
