//! Network-status client used to discover trust anchors.
//!
//! Endpoints are CometBFT RPC base URLs such as
//! `https://rpc.provider-state-sync-01.ics-testnet.polypore.xyz:443`. Two
//! read-only routes are used: `GET {base}/status` for the chain tip and
//! `GET {base}/block?height=N` for the hash of a given block.

use crate::error::{RpcError, RpcResult};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Relative path of the status route.
pub const STATUS_PATH: &str = "status";
/// Relative path of the block lookup route.
pub const BLOCK_PATH: &str = "block";

/// Read access to a remote node's status and block index.
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// Latest block height known to `endpoint`.
    async fn latest_height(&self, endpoint: &str) -> RpcResult<u64>;

    /// Hash of the block at `height` as reported by `endpoint`.
    async fn block_hash(&self, endpoint: &str, height: u64) -> RpcResult<String>;
}

#[async_trait]
impl<T: StatusClient + ?Sized> StatusClient for &T {
    async fn latest_height(&self, endpoint: &str) -> RpcResult<u64> {
        (**self).latest_height(endpoint).await
    }

    async fn block_hash(&self, endpoint: &str, height: u64) -> RpcResult<String> {
        (**self).block_hash(endpoint, height).await
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
struct SyncInfo {
    latest_block_height: HeightRepr,
}

#[derive(Debug, Deserialize)]
struct BlockResult {
    block_id: BlockId,
}

#[derive(Debug, Deserialize)]
struct BlockId {
    hash: String,
}

/// CometBFT encodes heights as decimal strings; some proxies emit numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HeightRepr {
    Number(u64),
    Text(String),
}

impl HeightRepr {
    fn value(&self) -> RpcResult<u64> {
        match self {
            HeightRepr::Number(height) => Ok(*height),
            HeightRepr::Text(text) => text.trim().parse::<u64>().map_err(|err| {
                RpcError::invalid_response(format!("latest_block_height '{text}': {err}"))
            }),
        }
    }
}

/// [`StatusClient`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpStatusClient {
    http_client: Client,
}

impl HttpStatusClient {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> RpcResult<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }

    /// Creates a client from an existing HTTP client.
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }

    fn route(endpoint: &str, path: &str) -> RpcResult<Url> {
        let base = endpoint.trim().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|err| RpcError::invalid_endpoint(endpoint, err.to_string()))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> RpcResult<T> {
        debug!(target: "nodeboot", url = %url, "querying status endpoint");
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        let content = response.text().await?;
        let envelope: RpcEnvelope<T> = serde_json::from_str(&content)?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl StatusClient for HttpStatusClient {
    async fn latest_height(&self, endpoint: &str) -> RpcResult<u64> {
        let url = Self::route(endpoint, STATUS_PATH)?;
        let status: StatusResult = self.get_json(url).await?;
        status.sync_info.latest_block_height.value()
    }

    async fn block_hash(&self, endpoint: &str, height: u64) -> RpcResult<String> {
        let mut url = Self::route(endpoint, BLOCK_PATH)?;
        url.query_pairs_mut()
            .append_pair("height", &height.to_string());
        let block: BlockResult = self.get_json(url).await?;
        Ok(block.block_id.hash)
    }
}
