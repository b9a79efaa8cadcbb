use super::UpstreamError;
use crate::domain_model::{AuthorizationCode, LongLivedToken, ShortLivedToken};

/// The provider's three token endpoints. Implementations keep no local state.
#[async_trait::async_trait]
pub trait TokenExchangeClient: Send + Sync {
    /// Trades a single-use authorization code for a short-lived token.
    async fn exchange_code(&self, code: &AuthorizationCode)
    -> Result<ShortLivedToken, UpstreamError>;
    async fn upgrade_to_long_lived(
        &self,
        token: &ShortLivedToken,
    ) -> Result<LongLivedToken, UpstreamError>;
    /// Extends a long-lived token that has not expired yet.
    async fn refresh(&self, access_token: &str) -> Result<LongLivedToken, UpstreamError>;
}
