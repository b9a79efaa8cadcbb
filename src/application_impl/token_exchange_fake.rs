use crate::application_port::{TokenExchangeClient, UpstreamError};
use crate::domain_model::{AuthorizationCode, LongLivedToken, ShortLivedToken};

pub const FAKE_USER_ID: &str = "12345678";
const SIXTY_DAYS_SECS: u64 = 60 * 24 * 60 * 60;

/// Offline stand-in for the provider's token endpoints.
#[derive(Debug, Default)]
pub struct FakeTokenExchangeClient;

impl FakeTokenExchangeClient {
    pub fn new() -> Self {
        Self
    }
}

// The code "error" and tokens without the fake prefix simulate provider
// failures.
#[async_trait::async_trait]
impl TokenExchangeClient for FakeTokenExchangeClient {
    async fn exchange_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<ShortLivedToken, UpstreamError> {
        if code.0 == "error" {
            return Err(UpstreamError::with_status(
                "exchange_code",
                400,
                "Simulated invalid authorization code",
            ));
        }
        Ok(ShortLivedToken {
            access_token: format!("fake-short-token:{}", code.0),
            user_id: Some(FAKE_USER_ID.to_string()),
        })
    }

    async fn upgrade_to_long_lived(
        &self,
        token: &ShortLivedToken,
    ) -> Result<LongLivedToken, UpstreamError> {
        let code = token
            .access_token
            .strip_prefix("fake-short-token:")
            .ok_or_else(|| {
                UpstreamError::with_status("upgrade_to_long_lived", 400, "Simulated invalid token")
            })?;
        Ok(fake_long_lived(format!("fake-long-token:{}", code)))
    }

    async fn refresh(&self, access_token: &str) -> Result<LongLivedToken, UpstreamError> {
        if !access_token.starts_with("fake-long-token:") {
            return Err(UpstreamError::with_status(
                "refresh_token",
                400,
                "Simulated invalid token",
            ));
        }
        Ok(fake_long_lived(format!(
            "fake-long-token:refreshed-{}",
            nanoid::nanoid!(8)
        )))
    }
}

fn fake_long_lived(access_token: String) -> LongLivedToken {
    LongLivedToken {
        access_token,
        token_type: Some("bearer".to_string()),
        expires_in: Some(SIXTY_DAYS_SECS),
    }
}
