use super::ProviderConfig;
use crate::application_port::*;
use crate::domain_model::{AuthorizationCode, CsrfState, SessionClaims, UserId};
use crate::domain_port::ResponseCache;
use crate::logger::*;
use std::sync::Arc;
use url::Url;

pub struct RealAuthFlowService {
    token_exchange: Arc<dyn TokenExchangeClient>,
    media_service: Arc<dyn MediaService>,
    session_codec: Arc<dyn SessionCodec>,
    cache: Arc<dyn ResponseCache>,
    config: ProviderConfig,
}

impl RealAuthFlowService {
    pub fn new(
        token_exchange: Arc<dyn TokenExchangeClient>,
        media_service: Arc<dyn MediaService>,
        session_codec: Arc<dyn SessionCodec>,
        cache: Arc<dyn ResponseCache>,
        config: ProviderConfig,
    ) -> Self {
        Self {
            token_exchange,
            media_service,
            session_codec,
            cache,
            config,
        }
    }
}

#[async_trait::async_trait]
impl AuthFlowService for RealAuthFlowService {
    fn authorize_url(&self, state: &CsrfState) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.app_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope)
            .append_pair("response_type", "code")
            .append_pair("state", state.as_str());
        url
    }

    async fn complete(
        &self,
        callback: CallbackParams,
        saved_state: Option<CsrfState>,
    ) -> Result<IssuedSession, AuthFlowError> {
        if let Some(reason) = callback.provider_error() {
            warn!(reason, "provider denied authorization");
            return Err(AuthFlowError::ProviderDenied(reason.to_string()));
        }

        let state_ok = saved_state
            .as_ref()
            .is_some_and(|saved| saved.matches(callback.state.as_deref()));
        if !state_ok {
            warn!(
                has_cookie = saved_state.is_some(),
                has_state = callback.state.is_some(),
                "callback state rejected"
            );
            return Err(AuthFlowError::CsrfMismatch);
        }

        let code = callback
            .code
            .filter(|c| !c.is_empty())
            .map(AuthorizationCode)
            .ok_or(AuthFlowError::Validation("Authorization code is required"))?;

        let short_lived = self.token_exchange.exchange_code(&code).await?;
        let long_lived = self
            .token_exchange
            .upgrade_to_long_lived(&short_lived)
            .await?;
        let profile = self
            .media_service
            .get_profile(&long_lived.access_token)
            .await?;

        let user_id = UserId::new(profile.id);
        let session = self
            .session_codec
            .issue(&user_id, &profile.username, &long_lived)?;
        info!(%user_id, username = %profile.username, exp = session.claims.exp, "session issued");
        Ok(session)
    }

    async fn refresh(
        &self,
        claims: &SessionClaims,
        access_token: &str,
    ) -> Result<RefreshedSession, AuthFlowError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(AuthFlowError::Validation("Access token is required"));
        }
        if access_token != claims.access_token {
            return Err(AuthFlowError::Validation(
                "Access token does not belong to this session",
            ));
        }

        let token = self.token_exchange.refresh(access_token).await?;
        let session = self
            .session_codec
            .issue(&claims.user_id, &claims.username, &token)?;

        let removed = self.cache.invalidate_user(&claims.user_id);
        info!(user_id = %claims.user_id, removed, "token refreshed, user cache cleared");

        Ok(RefreshedSession { token, session })
    }
}
