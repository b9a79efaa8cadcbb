use crate::application_port::{IssuedSession, SessionCodec, SessionError, SessionRejection};
use crate::domain_model::{LongLivedToken, SessionClaims, SessionToken, UserId};
use crate::domain_port::Clock;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct SessionConfig {
    pub ttl: Duration,
    pub signing_key: Vec<u8>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// HS256 session tokens. Expiry is checked against the injected clock
/// rather than inside `jsonwebtoken`, so there is no leeway and a token is
/// dead from the second `exp` is reached.
pub struct JwtSessionCodec {
    cfg: SessionConfig,
    clock: Arc<dyn Clock>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionCodec {
    pub fn new(cfg: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        JwtSessionCodec {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            cfg,
            clock,
            validation,
        }
    }

    /// Configured TTL, shortened to the provider token's remaining lifetime
    /// when that is known.
    fn lifetime(&self, token: &LongLivedToken) -> i64 {
        let configured = self.cfg.ttl.as_secs();
        let lifetime = match token.expires_in {
            Some(provider) if provider > 0 => configured.min(provider),
            _ => configured,
        };
        i64::try_from(lifetime).unwrap_or(i64::MAX)
    }
}

impl SessionCodec for JwtSessionCodec {
    fn issue(
        &self,
        user_id: &UserId,
        username: &str,
        token: &LongLivedToken,
    ) -> Result<IssuedSession, SessionError> {
        let iat = self.clock.now().timestamp();
        let claims = SessionClaims {
            user_id: user_id.clone(),
            username: username.to_string(),
            access_token: token.access_token.clone(),
            token_type: token.token_type.clone(),
            expires_in: token.expires_in,
            iat,
            exp: iat.saturating_add(self.lifetime(token)),
        };
        let raw = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Signing(e.to_string()))?;

        Ok(IssuedSession {
            token: SessionToken(raw),
            claims,
        })
    }

    fn verify(&self, raw: &str) -> Result<SessionClaims, SessionRejection> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SessionRejection::Missing);
        }

        let data = decode::<SessionClaims>(raw, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => SessionRejection::SignatureInvalid,
                ErrorKind::ExpiredSignature => SessionRejection::Expired,
                _ => SessionRejection::Malformed,
            },
        )?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(SessionRejection::Expired);
        }
        Ok(data.claims)
    }
}
