/// Any failure talking to the provider: transport, timeout, non-2xx status or
/// an undecodable body. `detail` keeps the provider's own message for logs;
/// it is not meant for end users.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} failed: {detail}")]
pub struct UpstreamError {
    pub operation: &'static str,
    pub status: Option<u16>,
    pub detail: String,
}

impl UpstreamError {
    pub fn new(operation: &'static str, detail: impl Into<String>) -> Self {
        UpstreamError {
            operation,
            status: None,
            detail: detail.into(),
        }
    }

    pub fn with_status(operation: &'static str, status: u16, detail: impl Into<String>) -> Self {
        UpstreamError {
            operation,
            status: Some(status),
            detail: detail.into(),
        }
    }
}
