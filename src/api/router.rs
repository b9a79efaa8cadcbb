use super::error::*;
use super::handler;
use crate::application_port::SessionCodec;
use crate::domain_model::SessionClaims;
use crate::infra_memory::{FixedWindowRateLimiter, RateDecision};
use crate::logger::*;
use crate::server::*;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use warp::http::{HeaderMap, HeaderValue};
use warp::path::FullPath;
use warp::{Filter, reject};

const MAX_JSON_BODY_BYTES: u64 = 16 * 1024;

/// Path plus raw query of the current request, as used for cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget(pub String);

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let options = Arc::new(server.http_options.clone());

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::health);

    let authorize = warp::path!("auth" / "provider")
        .and(warp::get())
        .and(with(server.auth_flow.clone()))
        .and(with(options.clone()))
        .and_then(handler::start_authorization);

    let callback = warp::path!("auth" / "provider" / "callback")
        .and(warp::get())
        .and(warp::query::<crate::application_port::CallbackParams>())
        .and(warp::cookie::optional(handler::STATE_COOKIE))
        .and(with(server.auth_flow.clone()))
        .and(with(options.clone()))
        .and_then(handler::callback);

    let refresh_token = warp::path!("auth" / "refresh-token")
        .and(warp::post())
        .and(with_session(server.session_codec.clone()))
        .and(warp::body::content_length_limit(MAX_JSON_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.auth_flow.clone()))
        .and_then(handler::refresh_token);

    let profile = warp::path("profile")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_session(server.session_codec.clone()))
        .and(request_target())
        .and(with(server.media_service.clone()))
        .and(with(server.cache.clone()))
        .and(with(options.clone()))
        .and_then(handler::profile);

    let media = warp::path("media")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handler::MediaQuery>())
        .and(with_session(server.session_codec.clone()))
        .and(request_target())
        .and(with(server.media_service.clone()))
        .and(with(server.cache.clone()))
        .and(with(options.clone()))
        .and_then(handler::media);

    let media_details = warp::path("media")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_session(server.session_codec.clone()))
        .and(request_target())
        .and(with(server.media_service.clone()))
        .and(with(server.cache.clone()))
        .and(with(options.clone()))
        .and_then(handler::media_details);

    let clear_cache = warp::path("clear-cache")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_session(server.session_codec.clone()))
        .and(with(server.cache.clone()))
        .and_then(handler::clear_cache);

    let api = warp::path("api")
        .and(rate_limited(server.rate_limiter.clone()))
        .and(profile.or(media).or(media_details).or(clear_cache));

    let cors = warp::cors()
        .allow_origins(options.cors_origins.iter().map(String::as_str))
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allow_headers(vec!["Content-Type", "Authorization"])
        .allow_credentials(true);

    // Recover inside CORS so error envelopes carry the CORS headers too; the
    // outer recover only sees rejections raised by the CORS filter itself.
    health
        .or(authorize)
        .or(callback)
        .or(refresh_token)
        .or(api)
        .recover(recover_error)
        .with(cors)
        .recover(recover_error)
        .with(warp::reply::with::headers(security_headers()))
        .with(warp::trace::request())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Verifies `Authorization: Bearer <token>`. A missing header, or one without
/// the bearer scheme, is reported the same as an empty token.
fn with_session(
    session_codec: Arc<dyn SessionCodec>,
) -> impl Filter<Extract = (SessionClaims,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let session_codec = session_codec.clone();
        async move {
            let token = header
                .as_deref()
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::trim)
                .unwrap_or_default();
            session_codec
                .verify(token)
                .map_err(ApiError::from)
                .map_err(reject::custom)
        }
    })
}

fn request_target() -> impl Filter<Extract = (RequestTarget,), Error = Infallible> + Clone {
    warp::path::full()
        .and(
            warp::query::raw()
                .or(warp::any().map(String::new))
                .unify(),
        )
        .map(|path: FullPath, query: String| {
            if query.is_empty() {
                RequestTarget(path.as_str().to_string())
            } else {
                RequestTarget(format!("{}?{}", path.as_str(), query))
            }
        })
}

/// Counts the request against its client address. Requests without a known
/// peer address share one bucket.
fn rate_limited(
    rate_limiter: Arc<FixedWindowRateLimiter>,
) -> impl Filter<Extract = (), Error = warp::Rejection> + Clone {
    warp::addr::remote()
        .and_then(move |addr: Option<SocketAddr>| {
            let rate_limiter = rate_limiter.clone();
            async move {
                let client = addr
                    .map(|addr| addr.ip())
                    .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                match rate_limiter.check(client) {
                    RateDecision::Allowed { .. } => Ok(()),
                    RateDecision::Limited { retry_after } => {
                        let retry_after_secs =
                            retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                        warn!(%client, retry_after_secs, "rate limit exceeded");
                        Err(reject::custom(ApiError::RateLimited { retry_after_secs }))
                    }
                }
            }
        })
        .untuple_one()
}

fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers
}
