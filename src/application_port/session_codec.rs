use crate::domain_model::{LongLivedToken, SessionClaims, SessionToken, UserId};

/// Why a presented session token was not accepted. Every variant is an
/// authentication failure; they differ only in the message shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionRejection {
    #[error("Authentication required. Please provide a valid token.")]
    Missing,
    #[error("Invalid token. Please login again.")]
    Malformed,
    #[error("Invalid token. Please login again.")]
    SignatureInvalid,
    #[error("Token expired. Please login again.")]
    Expired,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session token rejected: {0:?}")]
    Rejected(SessionRejection),
    #[error("session signing failed: {0}")]
    Signing(String),
}

impl From<SessionRejection> for SessionError {
    fn from(rejection: SessionRejection) -> Self {
        SessionError::Rejected(rejection)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: SessionToken,
    pub claims: SessionClaims,
}

/// Mints and checks the signed credential handed to the browser.
pub trait SessionCodec: Send + Sync {
    fn issue(
        &self,
        user_id: &UserId,
        username: &str,
        token: &LongLivedToken,
    ) -> Result<IssuedSession, SessionError>;

    fn verify(&self, raw: &str) -> Result<SessionClaims, SessionRejection>;
}
