use super::{IssuedSession, SessionError, UpstreamError};
use crate::domain_model::{CsrfState, LongLivedToken, SessionClaims};
use serde::Deserialize;
use url::Url;

/// Query parameters the provider appends to the callback redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_reason: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// The most descriptive provider error, if the user denied access or the
    /// provider failed the authorization.
    pub fn provider_error(&self) -> Option<&str> {
        self.error.as_ref()?;
        self.error_description
            .as_deref()
            .or(self.error_reason.as_deref())
            .or(self.error.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub token: LongLivedToken,
    pub session: IssuedSession,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    #[error("provider reported an authorization error: {0}")]
    ProviderDenied(String),
    #[error("state parameter missing or mismatched")]
    CsrfMismatch,
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Orchestrates the authorization-code flow and explicit token refresh.
#[async_trait::async_trait]
pub trait AuthFlowService: Send + Sync {
    fn authorize_url(&self, state: &CsrfState) -> Url;

    /// Verifies the echoed state against the one saved at redirect time, then
    /// runs code exchange, long-lived upgrade and profile lookup before
    /// issuing a session. Nothing is sent upstream unless the state matches.
    async fn complete(
        &self,
        callback: CallbackParams,
        saved_state: Option<CsrfState>,
    ) -> Result<IssuedSession, AuthFlowError>;

    /// Refreshes the long-lived token of an authenticated session, re-issues
    /// the session and drops the user's cached responses.
    async fn refresh(
        &self,
        claims: &SessionClaims,
        access_token: &str,
    ) -> Result<RefreshedSession, AuthFlowError>;
}
