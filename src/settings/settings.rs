use anyhow::{Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub provider: Provider,
    pub session: Session,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub cors: Cors,
    #[serde(default)]
    pub rate_limit: RateLimit,
    #[serde(default)]
    pub frontend: Frontend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Deserialize)]
pub struct Provider {
    pub backend: String, // "fake" or "real"
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_long_lived_token_url")]
    pub long_lived_token_url: String,
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Provider {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Hand-written so the app secret never lands in the startup log.
impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("backend", &self.backend)
            .field("app_id", &self.app_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("long_lived_token_url", &self.long_lived_token_url)
            .field("graph_url", &self.graph_url)
            .field("scope", &self.scope)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Deserialize)]
pub struct Session {
    pub secret: String,
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
}

impl Session {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
    pub default_ttl_secs: u64,
    /// Per-route overrides; profile and media details fall back to
    /// `default_ttl_secs`.
    pub profile_ttl_secs: Option<u64>,
    pub media_ttl_secs: Option<u64>,
    pub media_details_ttl_secs: Option<u64>,
    /// Zero keeps the cache unbounded.
    pub max_entries: usize,
    pub sweep_interval_secs: u64,
}

impl Cache {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn profile_ttl(&self) -> Duration {
        self.profile_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.default_ttl())
    }

    pub fn media_ttl(&self) -> Duration {
        Duration::from_secs(self.media_ttl_secs.unwrap_or(30 * 60))
    }

    pub fn media_details_ttl(&self) -> Duration {
        self.media_details_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.default_ttl())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            default_ttl_secs: 3600,
            profile_ttl_secs: None,
            media_ttl_secs: None,
            media_details_ttl_secs: None,
            max_entries: 0,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cors {
    pub origins: Vec<String>,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:5500".to_string(),
                "http://localhost:5500".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl RateLimit {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs.max(1))
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            max_requests: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Frontend {
    pub redirect_url: String,
}

impl Default for Frontend {
    fn default() -> Self {
        Self {
            redirect_url: "/".to_string(),
        }
    }
}

fn default_authorize_url() -> String {
    "https://api.instagram.com/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://api.instagram.com/oauth/access_token".to_string()
}

fn default_long_lived_token_url() -> String {
    "https://graph.instagram.com/access_token".to_string()
}

fn default_graph_url() -> String {
    "https://graph.instagram.com".to_string()
}

fn default_scope() -> String {
    "user_profile,user_media".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_session_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.session.secret.trim().is_empty() {
            return Err(anyhow!("session.secret must not be empty"));
        }
        if self.session.ttl_secs == 0 {
            return Err(anyhow!("session.ttl_secs must be positive"));
        }
        match self.provider.backend.as_str() {
            "fake" => {}
            "real" => {
                for (name, value) in [
                    ("provider.app_id", &self.provider.app_id),
                    ("provider.app_secret", &self.provider.app_secret),
                    ("provider.redirect_uri", &self.provider.redirect_uri),
                ] {
                    if value.trim().is_empty() {
                        return Err(anyhow!("{} is required for the real backend", name));
                    }
                }
            }
            other => return Err(anyhow!("Unknown provider backend: {}", other)),
        }
        for origin in &self.cors.origins {
            let parsed = url::Url::parse(origin)
                .map_err(|e| anyhow!("cors.origins entry {:?} is invalid: {}", origin, e))?;
            if parsed.origin().ascii_serialization() != *origin {
                return Err(anyhow!(
                    "cors.origins entry {:?} must be a bare origin such as http://localhost:5500",
                    origin
                ));
            }
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            return Err(anyhow!("http.cert_path and http.key_path must be set together"));
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "FEEDGATE";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);
    build_settings(File::with_name(path))
}

/// Parses settings from an in-memory TOML document, still applying the
/// environment overlay.
pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    build_settings(File::from_str(toml, FileFormat::Toml))
}

fn build_settings<S>(source: S) -> Result<Settings>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings: Settings = Config::builder()
        .add_source(source)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.origins")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
