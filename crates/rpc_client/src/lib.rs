//! Nodeboot RPC Client Library
//!
//! Read-only queries against CometBFT RPC endpoints: chain tip and block
//! hashes for state-sync trust anchors, plus remote genesis download.

mod anchor;
mod error;
mod genesis;
mod resolver;
mod status_client;

pub use anchor::{trust_height, TrustAnchor, BLOCK_HASH_SIZE, TRUST_SAFETY_MARGIN};
pub use error::{RpcError, RpcResult};
pub use genesis::fetch_genesis;
pub use resolver::TrustAnchorResolver;
pub use status_client::{HttpStatusClient, StatusClient, BLOCK_PATH, STATUS_PATH};
