use crate::settings;
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

/// Provider endpoints and app credentials, validated once at startup.
#[derive(Clone)]
pub struct ProviderConfig {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub authorize_url: Url,
    pub token_url: Url,
    pub long_lived_token_url: Url,
    pub graph_url: Url,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn from_settings(provider: &settings::Provider) -> Result<Self> {
        let parse = |name: &str, value: &str| {
            Url::parse(value).with_context(|| format!("provider.{} is not a valid URL", name))
        };

        Ok(ProviderConfig {
            app_id: provider.app_id.clone(),
            app_secret: provider.app_secret.clone(),
            redirect_uri: provider.redirect_uri.clone(),
            scope: provider.scope.clone(),
            authorize_url: parse("authorize_url", &provider.authorize_url)?,
            token_url: parse("token_url", &provider.token_url)?,
            long_lived_token_url: parse("long_lived_token_url", &provider.long_lived_token_url)?,
            graph_url: parse("graph_url", &provider.graph_url)?,
            timeout: provider.timeout(),
        })
    }

    /// `{graph_url}/{path}` without collapsing a versioned base path.
    pub fn graph_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.graph_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Shared client for every provider call. Token endpoints answer
    /// directly, so redirects are never followed.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build provider HTTP client")
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("app_id", &self.app_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("authorize_url", &self.authorize_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("long_lived_token_url", &self.long_lived_token_url.as_str())
            .field("graph_url", &self.graph_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
