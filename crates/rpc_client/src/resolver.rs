//! Trust-anchor discovery across untrusted status endpoints.

use crate::anchor::{trust_height, TrustAnchor};
use crate::error::RpcResult;
use crate::status_client::StatusClient;
use tracing::{info, warn};

/// Walks candidate endpoints in order and returns the first usable anchor.
///
/// Each endpoint is asked for its tip, then for the hash of the block
/// `safety_margin` blocks below the tip. Any failure on one endpoint moves on
/// to the next; there is no retry of the same endpoint.
#[derive(Debug, Clone)]
pub struct TrustAnchorResolver<C> {
    client: C,
    safety_margin: u64,
}

impl<C: StatusClient> TrustAnchorResolver<C> {
    /// Creates a resolver over `client`.
    pub fn new(client: C, safety_margin: u64) -> Self {
        Self {
            client,
            safety_margin,
        }
    }

    /// Blocks subtracted from the tip.
    pub fn safety_margin(&self) -> u64 {
        self.safety_margin
    }

    /// Resolves an anchor, or `None` when every endpoint failed.
    pub async fn resolve<S: AsRef<str>>(&self, endpoints: &[S]) -> Option<TrustAnchor> {
        for endpoint in endpoints {
            let endpoint = endpoint.as_ref().trim();
            if endpoint.is_empty() {
                continue;
            }
            info!(target: "nodeboot", endpoint, "fetching trust settings");
            match self.resolve_from(endpoint).await {
                Ok(anchor) => {
                    info!(
                        target: "nodeboot",
                        endpoint,
                        trust_height = anchor.height(),
                        trust_hash = anchor.hash(),
                        "trust anchor resolved"
                    );
                    return Some(anchor);
                }
                Err(err) => {
                    warn!(
                        target: "nodeboot",
                        endpoint,
                        error = %err,
                        "failed to fetch trust settings; trying next endpoint"
                    );
                }
            }
        }

        warn!(target: "nodeboot", "could not fetch trust settings from any RPC server");
        None
    }

    async fn resolve_from(&self, endpoint: &str) -> RpcResult<TrustAnchor> {
        let latest = self.client.latest_height(endpoint).await?;
        let height = trust_height(latest, self.safety_margin)?;
        let hash = self.client.block_hash(endpoint, height).await?;
        TrustAnchor::new(height, hash)
    }
}
