//! Node response types and error definitions.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Connection or transport failure.
    #[error("Node RPC error: {0}")]
    Rpc(String),

    /// Request timed out.
    #[error("Node request timed out after {0} seconds")]
    Timeout(u64),

    /// The node refused a submitted transaction group.
    #[error("Node rejected transaction: {0}")]
    Rejected(String),

    /// Non-success HTTP status.
    #[error("Node returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Failed to decode node response: {0}")]
    Decode(String),
}

impl NodeError {
    /// Whether a read may be retried or sent to another endpoint.
    pub fn is_transient(&self) -> bool {
        match self {
            NodeError::Rpc(_) | NodeError::Timeout(_) => true,
            NodeError::Http { status, .. } => *status == 429 || *status >= 500,
            NodeError::Rejected(_) | NodeError::Decode(_) => false,
        }
    }
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Account state as reported by `GET /v2/accounts/{address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccountInfo {
    pub address: String,
    pub amount: u64,
    #[serde(default)]
    pub min_balance: u64,
    #[serde(default)]
    pub round: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<AssetHolding>>,
}

/// One asset holding on an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetHolding {
    pub asset_id: u64,
    pub amount: u64,
    #[serde(default)]
    pub is_frozen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    pub last_round: u64,
}

/// Pool entry from `GET /v2/transactions/pending/{txid}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransaction {
    #[serde(default)]
    pub confirmed_round: Option<u64>,
    #[serde(default)]
    pub pool_error: String,
    #[serde(default)]
    pub asset_index: Option<u64>,
    #[serde(default)]
    pub application_index: Option<u64>,
}

/// Result of a health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRecord {
    pub endpoint: String,
    #[serde(with = "duration_millis")]
    pub latency: Duration,
}

/// A transaction the node reports as included in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedTransaction {
    pub id: String,
    pub confirmed_round: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pool_error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_index: Option<u64>,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
