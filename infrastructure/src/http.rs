//! Shared HTTP plumbing for the JSON APIs the adapters talk to.

use grounded_application::GatewayError;
use grounded_domain::util::truncate_str;
use reqwest::Response;
use serde::de::DeserializeOwned;

/// Longest error body echoed into a [`GatewayError`].
const MAX_ERROR_BODY: usize = 512;

/// Classify a transport failure.
pub(crate) fn send_error(service: &str, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(format!("{service}: {e}"))
    } else {
        GatewayError::RequestFailed(format!("{service}: {e}"))
    }
}

/// Decode a JSON body, turning non-2xx statuses into [`GatewayError::RequestFailed`].
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &str,
    response: Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::RequestFailed(format!(
            "{service} returned {status}: {}",
            truncate_str(body.trim(), MAX_ERROR_BODY)
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::InvalidResponse(format!("{service}: {e}")))
}
