use super::handler::ApiResponse;
use crate::application_port::*;
use crate::domain_model::InvalidMediaId;
use crate::logger::*;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::header::RETRY_AFTER;
use warp::http::{HeaderValue, StatusCode};
use warp::reply::Response;
use warp::{Rejection, Reply, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(err) = err.find::<ApiError>() {
        return Ok(err.to_reply());
    }

    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        debug!("rejected request body: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON body".to_string(),
        )
    } else if err.find::<warp::filters::cors::CorsForbidden>().is_some() {
        (StatusCode::FORBIDDEN, "Origin not allowed".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        error!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal.to_string(),
        )
    };

    Ok(error_reply(status, message))
}

fn error_reply(status: StatusCode, message: String) -> Response {
    let json = warp::reply::json(&ApiResponse::<()>::err(message));
    warp::reply::with_status(json, status).into_response()
}

/// Every failure a route can end in. The display text is what the client
/// sees; provider detail only goes to the log.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Invalid state parameter. Authentication failed.")]
    CsrfMismatch,
    #[error("Authentication error: {0}")]
    ProviderAuth(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(SessionRejection),
    #[error("Too many requests, please try again later.")]
    RateLimited { retry_after_secs: u64 },
    #[error("{0}")]
    Upstream(&'static str),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::CsrfMismatch | ApiError::ProviderAuth(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error envelope for this failure, with `Retry-After` when rate limited.
    pub fn to_reply(&self) -> Response {
        let mut res = error_reply(self.status(), self.to_string());
        if let ApiError::RateLimited { retry_after_secs } = self {
            res.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
        }
        res
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiError {
        warn!("Internal error: {}", error);
        ApiError::Internal
    }

    /// Logs the provider failure and replaces it with `context`.
    pub fn upstream(context: &'static str, error: UpstreamError) -> ApiError {
        warn!(
            operation = error.operation,
            status = ?error.status,
            detail = %error.detail,
            "{}", context
        );
        ApiError::Upstream(context)
    }

    /// Maps an auth flow failure; upstream failures become `context`.
    pub fn from_auth_flow(context: &'static str, error: AuthFlowError) -> ApiError {
        match error {
            AuthFlowError::ProviderDenied(reason) => ApiError::ProviderAuth(reason),
            AuthFlowError::CsrfMismatch => ApiError::CsrfMismatch,
            AuthFlowError::Validation(message) => ApiError::Validation(message.to_string()),
            AuthFlowError::Upstream(e) => ApiError::upstream(context, e),
            AuthFlowError::Session(SessionError::Rejected(r)) => ApiError::Unauthenticated(r),
            AuthFlowError::Session(e) => ApiError::internal(e),
        }
    }
}

impl reject::Reject for ApiError {}

impl From<SessionRejection> for ApiError {
    fn from(rejection: SessionRejection) -> Self {
        ApiError::Unauthenticated(rejection)
    }
}

impl From<InvalidMediaId> for ApiError {
    fn from(_: InvalidMediaId) -> Self {
        ApiError::Validation("Invalid media id".to_string())
    }
}
