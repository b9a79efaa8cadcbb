use super::error::*;
use super::router::RequestTarget;
use crate::application_port::*;
use crate::domain_model::{CsrfState, MediaId, MediaLimit, Profile, SessionClaims};
use crate::domain_port::{CacheKey, CachedPayload, ResponseCache};
use crate::logger::*;
use crate::server::HttpOptions;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use warp::http::header::{CONTENT_TYPE, SET_COOKIE};
use warp::http::{HeaderValue, StatusCode, Uri};
use warp::{Reply, reject};

pub const STATE_COOKIE: &str = "oauth_state";
const STATE_COOKIE_MAX_AGE_SECS: u64 = 60 * 60;

const PROFILE_PICTURE_PLACEHOLDER: &str = "https://via.placeholder.com/150";

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Envelope shared by every JSON reply.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            status: ResponseStatus::Success,
            data: Some(data),
            message: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        ApiResponse {
            status: ResponseStatus::Error,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            status: ResponseStatus::Success,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// A serialized envelope, either fresh or replayed from the cache.
pub struct CachedReply {
    payload: CachedPayload,
    hit: bool,
}

impl warp::Reply for CachedReply {
    fn into_response(self) -> warp::reply::Response {
        let mut res = warp::reply::Response::new(self.payload.to_string().into());
        let headers = res.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-cache",
            HeaderValue::from_static(if self.hit { "HIT" } else { "MISS" }),
        );
        res
    }
}

/// Serves `key` from the cache, or runs `fetch` and stores its successful
/// envelope for `ttl`. Failures are never cached.
async fn cache_aside<T, F, Fut>(
    cache: &dyn ResponseCache,
    key: CacheKey,
    ttl: Duration,
    fetch: F,
) -> Result<CachedReply, warp::Rejection>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    if let Some(payload) = cache.get(&key) {
        debug!(%key, "cache hit");
        return Ok(CachedReply { payload, hit: true });
    }

    let data = fetch().await.map_err(reject::custom)?;
    let payload: CachedPayload = serde_json::to_string(&ApiResponse::ok(data))
        .map_err(ApiError::internal)
        .map_err(reject::custom)?
        .into();
    cache.put(key, payload.clone(), ttl);
    Ok(CachedReply {
        payload,
        hit: false,
    })
}

fn state_cookie(value: &str, max_age_secs: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{STATE_COOKIE}={value}; Max-Age={max_age_secs}; Path=/auth; HttpOnly; SameSite=Lax{secure}"
    )
}

fn location(target: &str) -> Result<Uri, warp::Rejection> {
    target
        .parse::<Uri>()
        .map_err(ApiError::internal)
        .map_err(reject::custom)
}

pub async fn start_authorization(
    auth_flow: Arc<dyn AuthFlowService>,
    options: Arc<HttpOptions>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let state = CsrfState::generate();
    let authorize_url = auth_flow.authorize_url(&state);
    debug!("redirecting to provider authorization");

    let redirect = warp::redirect::found(location(authorize_url.as_str())?);
    Ok(warp::reply::with_header(
        redirect,
        SET_COOKIE,
        state_cookie(
            state.as_str(),
            STATE_COOKIE_MAX_AGE_SECS,
            options.secure_cookies,
        ),
    ))
}

pub async fn callback(
    params: CallbackParams,
    saved_state: Option<String>,
    auth_flow: Arc<dyn AuthFlowService>,
    options: Arc<HttpOptions>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let outcome = auth_flow
        .complete(params, saved_state.map(CsrfState))
        .await
        .map_err(|e| ApiError::from_auth_flow("Authentication failed. Please try again.", e));

    // Every callback reply expires the state cookie.
    let mut res = match outcome {
        Ok(session) => {
            let frontend = &options.frontend_redirect_url;
            let separator = if frontend.contains('?') { '&' } else { '?' };
            let target = format!("{frontend}{separator}token={}", session.token.as_str());
            warp::redirect::found(location(&target)?).into_response()
        }
        Err(e) => e.to_reply(),
    };
    let cleared = HeaderValue::from_str(&state_cookie("", 0, options.secure_cookies))
        .map_err(ApiError::internal)
        .map_err(reject::custom)?;
    res.headers_mut().insert(SET_COOKIE, cleared);
    Ok(res)
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    pub session_token: String,
}

pub async fn refresh_token(
    claims: SessionClaims,
    body: RefreshTokenRequest,
    auth_flow: Arc<dyn AuthFlowService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let access_token = body.access_token.unwrap_or_default();
    let refreshed = auth_flow
        .refresh(&claims, &access_token)
        .await
        .map_err(|e| ApiError::from_auth_flow("Failed to refresh token. Please login again.", e))
        .map_err(reject::custom)?;

    let response = RefreshTokenResponse {
        access_token: refreshed.token.access_token,
        token_type: refreshed.token.token_type,
        expires_in: refreshed.token.expires_in,
        session_token: refreshed.session.token.0,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    #[serde(flatten)]
    profile: Profile,
    profile_picture: &'static str,
}

pub async fn profile(
    claims: SessionClaims,
    target: RequestTarget,
    media_service: Arc<dyn MediaService>,
    cache: Arc<dyn ResponseCache>,
    options: Arc<HttpOptions>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let key = CacheKey::for_user(&claims.user_id, target.0);
    cache_aside(cache.as_ref(), key, options.cache_ttls.profile, || async {
        let profile = media_service
            .get_profile(&claims.access_token)
            .await
            .map_err(|e| ApiError::upstream("Failed to fetch profile information", e))?;
        Ok::<_, ApiError>(ProfileResponse {
            profile,
            profile_picture: PROFILE_PICTURE_PLACEHOLDER,
        })
    })
    .await
}

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub limit: Option<String>,
}

pub async fn media(
    query: MediaQuery,
    claims: SessionClaims,
    target: RequestTarget,
    media_service: Arc<dyn MediaService>,
    cache: Arc<dyn ResponseCache>,
    options: Arc<HttpOptions>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = MediaLimit::from_query(query.limit.as_deref());
    let key = CacheKey::for_user(&claims.user_id, target.0);
    cache_aside(cache.as_ref(), key, options.cache_ttls.media, || async {
        media_service
            .get_media(&claims.access_token, limit)
            .await
            .map_err(|e| ApiError::upstream("Failed to fetch media", e))
    })
    .await
}

pub async fn media_details(
    raw_id: String,
    claims: SessionClaims,
    target: RequestTarget,
    media_service: Arc<dyn MediaService>,
    cache: Arc<dyn ResponseCache>,
    options: Arc<HttpOptions>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id: MediaId = raw_id
        .parse()
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    let key = CacheKey::for_user(&claims.user_id, target.0);
    cache_aside(cache.as_ref(), key, options.cache_ttls.media_details, || async {
        media_service
            .get_media_details(&claims.access_token, &id)
            .await
            .map_err(|e| ApiError::upstream("Failed to fetch media details", e))
    })
    .await
}

pub async fn clear_cache(
    claims: SessionClaims,
    cache: Arc<dyn ResponseCache>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let removed = cache.invalidate_user(&claims.user_id);
    info!(user_id = %claims.user_id, removed, "user cache cleared");
    Ok(warp::reply::json(&ApiResponse::message(
        "Cache cleared successfully",
    )))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    let response = ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    });
    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        StatusCode::OK,
    ))
}
