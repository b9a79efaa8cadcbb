use super::user::opt_string_or_number;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! secret_debug {
    ($ty:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($ty), "(<redacted>)"))
            }
        }
    };
}

/// Single-use code handed back by the provider redirect.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationCode(pub String);
secret_debug!(AuthorizationCode);

/// Anti-forgery nonce tying the authorize redirect to its callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfState(pub String);

impl CsrfState {
    pub const LEN: usize = 32;

    pub fn generate() -> Self {
        CsrfState(nanoid::nanoid!(32))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Both sides must be present and equal.
    pub fn matches(&self, echoed: Option<&str>) -> bool {
        matches!(echoed, Some(s) if !s.is_empty() && s == self.0)
    }
}

/// Result of the code exchange. Lives only until it is upgraded.
#[derive(Clone, Deserialize)]
pub struct ShortLivedToken {
    pub access_token: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
}
secret_debug!(ShortLivedToken);

/// The ~60 day provider credential embedded in session tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongLivedToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}
secret_debug!(LongLivedToken);

/// Signed session credential returned to the browser.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);
secret_debug!(SessionToken);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_state_is_url_safe_and_fixed_length() {
        let state = CsrfState::generate();
        assert_eq!(state.as_str().len(), CsrfState::LEN);
        assert!(
            state
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        );
        assert!(state.matches(Some(state.as_str())));
    }
}
