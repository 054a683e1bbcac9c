//! State-sync trust anchors.

use crate::error::{RpcError, RpcResult};
use std::fmt;

/// Number of blocks subtracted from the latest height to pick a trust height.
///
/// Old enough to be final, young enough to stay inside the light-client
/// trusting period. Protocol constant; settings files cannot change it.
pub const TRUST_SAFETY_MARGIN: u64 = 2000;

/// Length in bytes of a block hash (SHA-256).
pub const BLOCK_HASH_SIZE: usize = 32;

/// A block checkpoint used to bootstrap state sync.
///
/// Only [`TrustAnchor::new`] builds one, so every anchor in circulation has
/// passed its checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    height: u64,
    hash: String,
}

impl TrustAnchor {
    /// Creates an anchor after checking the height is positive and the hash is
    /// a hex-encoded 32-byte digest.
    pub fn new(height: u64, hash: impl Into<String>) -> RpcResult<Self> {
        let hash = hash.into();
        if height == 0 {
            return Err(RpcError::invalid_response("trust height must be positive"));
        }
        if !is_block_hash(&hash) {
            return Err(RpcError::invalid_response(format!(
                "'{hash}' is not a {BLOCK_HASH_SIZE}-byte hex block hash"
            )));
        }
        Ok(Self { height, hash })
    }

    /// Trusted block height.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Hash of the block at [`Self::height`], as reported by the endpoint.
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.hash, self.height)
    }
}

/// Computes the trust height for a chain whose tip is `latest_height`.
pub fn trust_height(latest_height: u64, safety_margin: u64) -> RpcResult<u64> {
    match latest_height.checked_sub(safety_margin) {
        Some(height) if height > 0 => Ok(height),
        _ => Err(RpcError::ChainTooYoung {
            latest_height,
            safety_margin,
        }),
    }
}

fn is_block_hash(value: &str) -> bool {
    value.len() == BLOCK_HASH_SIZE * 2 && hex::decode(value).is_ok()
}
