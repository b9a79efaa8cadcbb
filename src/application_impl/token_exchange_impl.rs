use super::ProviderConfig;
use super::provider_http::read_json;
use crate::application_port::{TokenExchangeClient, UpstreamError};
use crate::domain_model::{AuthorizationCode, LongLivedToken, ShortLivedToken};
use crate::logger::*;

const EXCHANGE_GRANT: &str = "ig_exchange_token";
const REFRESH_GRANT: &str = "ig_refresh_token";

pub struct RealTokenExchangeClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl RealTokenExchangeClient {
    pub fn new(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait::async_trait]
impl TokenExchangeClient for RealTokenExchangeClient {
    async fn exchange_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<ShortLivedToken, UpstreamError> {
        let form = [
            ("client_id", self.config.app_id.as_str()),
            ("client_secret", self.config.app_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code.0.as_str()),
        ];
        let sent = self
            .http
            .post(self.config.token_url.clone())
            .form(&form)
            .send()
            .await;
        let token: ShortLivedToken = read_json("exchange_code", sent).await?;
        debug!(user_id = ?token.user_id, "authorization code exchanged");
        Ok(token)
    }

    async fn upgrade_to_long_lived(
        &self,
        token: &ShortLivedToken,
    ) -> Result<LongLivedToken, UpstreamError> {
        let sent = self
            .http
            .get(self.config.long_lived_token_url.clone())
            .query(&[
                ("grant_type", EXCHANGE_GRANT),
                ("client_secret", self.config.app_secret.as_str()),
                ("access_token", token.access_token.as_str()),
            ])
            .send()
            .await;
        let token: LongLivedToken = read_json("upgrade_to_long_lived", sent).await?;
        debug!(expires_in = ?token.expires_in, "short-lived token upgraded");
        Ok(token)
    }

    async fn refresh(&self, access_token: &str) -> Result<LongLivedToken, UpstreamError> {
        let sent = self
            .http
            .get(self.config.long_lived_token_url.clone())
            .query(&[("grant_type", REFRESH_GRANT), ("access_token", access_token)])
            .send()
            .await;
        let token: LongLivedToken = read_json("refresh_token", sent).await?;
        debug!(expires_in = ?token.expires_in, "long-lived token refreshed");
        Ok(token)
    }
}
