//! Remote genesis download.

use crate::error::{RpcError, RpcResult};
use reqwest::{Client, Url};
use tracing::info;

/// Downloads a genesis document and checks that it is a JSON object.
///
/// The body is returned verbatim so the written file matches what the
/// network published byte for byte.
pub async fn fetch_genesis(http_client: &Client, url: &str) -> RpcResult<String> {
    let parsed = Url::parse(url).map_err(|err| RpcError::invalid_endpoint(url, err.to_string()))?;
    info!(target: "nodeboot", url = %parsed, "downloading genesis");

    let content = http_client
        .get(parsed)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let document: serde_json::Value = serde_json::from_str(&content)?;
    if !document.is_object() {
        return Err(RpcError::invalid_response("genesis document is not a JSON object"));
    }
    Ok(content)
}
