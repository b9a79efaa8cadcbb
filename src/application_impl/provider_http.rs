use crate::application_port::UpstreamError;
use crate::logger::*;
use serde::de::DeserializeOwned;

const BODY_PREVIEW_CHARS: usize = 256;

/// Turns a provider response into `T`, or into an [`UpstreamError`] that keeps
/// the provider's message. Every failure is logged here so callers only
/// propagate it.
pub(crate) async fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    sent: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, UpstreamError> {
    let response = sent.map_err(|e| transport_error(operation, e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(operation, e))?;

    if !status.is_success() {
        let detail = provider_message(&body).unwrap_or_else(|| preview(&body));
        let err = UpstreamError::with_status(operation, status.as_u16(), detail);
        warn!(operation, status = status.as_u16(), error = %err, "provider returned an error");
        return Err(err);
    }

    serde_json::from_str(&body).map_err(|e| {
        let err = UpstreamError::with_status(
            operation,
            status.as_u16(),
            format!("unexpected response body: {}", e),
        );
        warn!(operation, error = %err, body = %preview(&body), "provider response did not decode");
        err
    })
}

fn transport_error(operation: &'static str, error: reqwest::Error) -> UpstreamError {
    // The request URL carries credentials in its query string.
    let error = error.without_url();
    let detail = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    warn!(operation, error = %detail, "provider request failed");
    UpstreamError::new(operation, detail)
}

/// Graph errors nest the message (`{"error":{"message":..}}`), OAuth errors
/// keep it at the top level under one of several names.
pub(crate) fn provider_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("error_message"))
        .or_else(|| value.get("error_description"))
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn preview(body: &str) -> String {
    if body.trim().is_empty() {
        return "empty response body".to_string();
    }
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
