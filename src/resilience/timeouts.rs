//! Timeout enforcement.

use std::future::Future;
use std::time::Duration;

use crate::node::types::{NodeError, NodeResult};

/// Run a node call under a deadline, mapping expiry to `NodeError::Timeout`.
pub async fn with_timeout<T, F>(duration: Duration, fut: F) -> NodeResult<T>
where
    F: Future<Output = NodeResult<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(NodeError::Timeout(duration.as_secs())),
    }
}
