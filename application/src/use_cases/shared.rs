//! Shared utilities for use cases.
//!
//! Every external call in the pipeline carries its own timeout; this module
//! turns an elapsed deadline into [`GatewayError::Timeout`].

use crate::ports::llm_gateway::GatewayError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Await `call`, failing with [`GatewayError::Timeout`] after `limit`.
pub(crate) async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "External call timed out");
            Err(GatewayError::Timeout)
        }
    }
}
