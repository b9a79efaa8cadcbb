use feedgate::api;
use feedgate::application_impl::FAKE_USER_ID;
use feedgate::domain_model::{LongLivedToken, UserId};
use feedgate::infra_memory::ManualClock;
use feedgate::server::Server;
use feedgate::settings::parse_settings_str;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use warp::http::{Response, StatusCode};
use warp::hyper::body::Bytes;

const FRONTEND: &str = "http://localhost:5500/";

fn settings_toml(max_requests: u32) -> String {
    format!(
        r#"
[http]
address = "127.0.0.1:0"

[log]
filter = "info"

[provider]
backend = "fake"
redirect_uri = "http://localhost:3000/auth/provider/callback"

[session]
secret = "api-routes-test-secret"

[rate_limit]
window_secs = 60
max_requests = {max_requests}

[frontend]
redirect_url = "{FRONTEND}"
"#
    )
}

async fn server_with(max_requests: u32) -> (Arc<ManualClock>, Arc<Server>) {
    let settings = parse_settings_str(&settings_toml(max_requests))
        .expect("Test settings should parse and validate.");
    let clock = Arc::new(ManualClock::default());
    let server = Server::try_new_with_clock(&settings, clock.clone())
        .await
        .expect("Server should build with the fake backend.");
    (clock, Arc::new(server))
}

async fn send(server: &Arc<Server>, request: warp::test::RequestBuilder) -> Response<Bytes> {
    request.reply(&api::routes(server.clone())).await
}

fn json(res: &Response<Bytes>) -> Value {
    serde_json::from_slice(res.body()).expect("Response body should be JSON.")
}

fn header<'a>(res: &'a Response<Bytes>, name: &str) -> &'a str {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_else(|| panic!("Response should carry a {name} header."))
}

fn session_for(server: &Server) -> String {
    let token = LongLivedToken {
        access_token: "fake-long-token:fixture".to_string(),
        token_type: Some("bearer".to_string()),
        expires_in: Some(60 * 24 * 60 * 60),
    };
    server
        .session_codec
        .issue(&UserId::from(FAKE_USER_ID), "demo_user", &token)
        .expect("Fixture session should be issued.")
        .token
        .0
}

fn get(path: &str, session: Option<&str>) -> warp::test::RequestBuilder {
    let request = warp::test::request().method("GET").path(path);
    match session {
        Some(token) => request.header("authorization", format!("Bearer {token}")),
        None => request,
    }
}

#[tokio::test]
async fn health_reports_ok_with_security_headers() {
    let (_clock, server) = server_with(100).await;
    let res = send(&server, get("/health", None)).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = json(&res);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(header(&res, "x-content-type-options"), "nosniff");
    assert_eq!(header(&res, "x-frame-options"), "DENY");
    assert_eq!(header(&res, "referrer-policy"), "no-referrer");
}

#[tokio::test]
async fn login_flow_sets_state_cookie_and_redirects_with_session() {
    let (_clock, server) = server_with(100).await;

    let res = send(&server, get("/auth/provider", None)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    let authorize = Url::parse(header(&res, "location")).expect("Location should be a URL.");
    let state = authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("Authorize URL should carry state.");
    let cookie = header(&res, "set-cookie");
    assert!(cookie.starts_with(&format!("oauth_state={state};")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=3600"));

    let res = send(
        &server,
        get(
            &format!("/auth/provider/callback?code=abc&state={state}"),
            None,
        )
        .header("cookie", format!("oauth_state={state}")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    let location = header(&res, "location");
    assert!(location.starts_with(FRONTEND));
    assert!(header(&res, "set-cookie").contains("Max-Age=0"));

    let redirect = Url::parse(location).expect("Location should be a URL.");
    let token = redirect
        .query_pairs()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
        .expect("Frontend redirect should carry the session token.");
    let claims = server
        .session_codec
        .verify(&token)
        .expect("Session from the callback should verify.");
    assert_eq!(claims.user_id, UserId::from(FAKE_USER_ID));
    assert_eq!(claims.username, "demo_user");
}

#[tokio::test]
async fn callback_with_forged_state_is_rejected() {
    let (_clock, server) = server_with(100).await;
    let res = send(
        &server,
        get("/auth/provider/callback?code=abc&state=forged", None)
            .header("cookie", "oauth_state=expected"),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json(&res);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "Invalid state parameter. Authentication failed."
    );
    assert!(header(&res, "set-cookie").contains("Max-Age=0"));
}

#[tokio::test]
async fn failed_exchange_after_state_check_still_clears_cookie() {
    let (_clock, server) = server_with(100).await;
    let res = send(
        &server,
        get("/auth/provider/callback?code=error&state=expected", None)
            .header("cookie", "oauth_state=expected"),
    )
    .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json(&res)["message"],
        "Authentication failed. Please try again."
    );
    let cookie = header(&res, "set-cookie");
    assert!(cookie.starts_with("oauth_state=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn callback_reports_provider_denial() {
    let (_clock, server) = server_with(100).await;
    let res = send(
        &server,
        get(
            "/auth/provider/callback?error=access_denied&error_reason=user_denied&error_description=Permissions+error",
            None,
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(&res)["message"], "Authentication error: Permissions error");
}

#[tokio::test]
async fn protected_routes_require_a_valid_session() {
    let (clock, server) = server_with(100).await;

    let res = send(&server, get("/api/profile", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json(&res)["message"],
        "Authentication required. Please provide a valid token."
    );

    let res = send(&server, get("/api/profile", Some("not-a-jwt"))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(&res)["message"], "Invalid token. Please login again.");

    let session = session_for(&server);
    clock.advance(Duration::from_secs(7 * 24 * 60 * 60));
    let res = send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(&res)["message"], "Token expired. Please login again.");
}

#[tokio::test]
async fn profile_is_cached_per_user_until_cleared() {
    let (_clock, server) = server_with(100).await;
    let session = session_for(&server);

    let first = send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-cache"), "MISS");
    assert_eq!(header(&first, "content-type"), "application/json");
    let body = json(&first);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["username"], "demo_user");
    assert!(body["data"]["profile_picture"].is_string());

    let second = send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(header(&second, "x-cache"), "HIT");
    assert_eq!(second.body(), first.body());

    let cleared = send(&server, get("/api/clear-cache", Some(&session))).await;
    assert_eq!(cleared.status(), StatusCode::OK);
    assert_eq!(json(&cleared)["message"], "Cache cleared successfully");

    let third = send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(header(&third, "x-cache"), "MISS");
}

#[tokio::test]
async fn media_list_honours_limit_and_keys_on_query() {
    let (_clock, server) = server_with(100).await;
    let session = session_for(&server);

    let three = send(&server, get("/api/media?limit=3", Some(&session))).await;
    assert_eq!(three.status(), StatusCode::OK);
    assert_eq!(json(&three)["data"]["data"].as_array().map(Vec::len), Some(3));

    let fallback = send(&server, get("/api/media?limit=abc", Some(&session))).await;
    assert_eq!(header(&fallback, "x-cache"), "MISS");
    assert_eq!(
        json(&fallback)["data"]["data"].as_array().map(Vec::len),
        Some(10)
    );

    let again = send(&server, get("/api/media?limit=3", Some(&session))).await;
    assert_eq!(header(&again, "x-cache"), "HIT");
}

#[tokio::test]
async fn media_details_validate_ids_and_map_failures() {
    let (_clock, server) = server_with(100).await;
    let session = session_for(&server);

    let carousel = send(&server, get("/api/media/fake_media_4", Some(&session))).await;
    assert_eq!(carousel.status(), StatusCode::OK);
    let body = json(&carousel);
    assert_eq!(body["data"]["media_type"], "CAROUSEL_ALBUM");
    assert_eq!(body["data"]["children"]["data"].as_array().map(Vec::len), Some(3));

    let invalid = send(&server, get("/api/media/bad%20id", Some(&session))).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(&invalid)["message"], "Invalid media id");

    let cached_before = server.cache.len();
    let missing = send(&server, get("/api/media/fake_media_99", Some(&session))).await;
    assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&missing)["message"], "Failed to fetch media details");
    assert!(missing.headers().get("x-cache").is_none());

    let retry = send(&server, get("/api/media/fake_media_99", Some(&session))).await;
    assert_eq!(retry.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(server.cache.len(), cached_before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_gets_on_cold_route_all_succeed() {
    let (_clock, server) = server_with(100).await;
    let session = session_for(&server);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let server = server.clone();
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            send(&server, get("/api/media?limit=3", Some(&session))).await
        }));
    }

    let mut misses = 0;
    for handle in handles {
        let res = handle.await.expect("Request task should not panic.");
        assert_eq!(res.status(), StatusCode::OK);
        let body = json(&res);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["data"].as_array().map(Vec::len), Some(3));
        if header(&res, "x-cache") == "MISS" {
            misses += 1;
        }
    }
    assert!(misses >= 1);
    assert_eq!(server.cache.len(), 1);
}

#[tokio::test]
async fn refresh_token_reissues_session_and_drops_cache() {
    let (_clock, server) = server_with(100).await;
    let session = session_for(&server);

    let warm = send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(header(&warm, "x-cache"), "MISS");

    let res = send(
        &server,
        warp::test::request()
            .method("POST")
            .path("/auth/refresh-token")
            .header("authorization", format!("Bearer {session}"))
            .json(&serde_json::json!({ "accessToken": "fake-long-token:fixture" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(&res);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["token_type"], "bearer");
    let refreshed = body["data"]["session_token"]
        .as_str()
        .expect("Refresh should return a session token.");
    let claims = server
        .session_codec
        .verify(refreshed)
        .expect("Refreshed session should verify.");
    assert_eq!(
        Some(claims.access_token.as_str()),
        body["data"]["access_token"].as_str()
    );

    let cold = send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(header(&cold, "x-cache"), "MISS");
}

#[tokio::test]
async fn refresh_token_requires_access_token() {
    let (_clock, server) = server_with(100).await;
    let session = session_for(&server);

    let res = send(
        &server,
        warp::test::request()
            .method("POST")
            .path("/auth/refresh-token")
            .header("authorization", format!("Bearer {session}"))
            .json(&serde_json::json!({})),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(&res)["message"], "Access token is required");
}

#[tokio::test]
async fn api_requests_are_rate_limited_per_client() {
    let (clock, server) = server_with(2).await;
    let session = session_for(&server);

    for _ in 0..2 {
        let res = send(&server, get("/api/profile", Some(&session))).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    let limited = send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        json(&limited)["message"],
        "Too many requests, please try again later."
    );
    assert_eq!(header(&limited, "retry-after"), "60");

    let health = send(&server, get("/health", None)).await;
    assert_eq!(health.status(), StatusCode::OK);

    clock.advance(Duration::from_secs(60));
    let res = send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_routes_and_methods_use_the_error_envelope() {
    let (_clock, server) = server_with(100).await;

    let res = send(&server, get("/nope", None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(&res)["status"], "error");

    let session = session_for(&server);
    let res = send(
        &server,
        warp::test::request()
            .method("POST")
            .path("/api/profile")
            .header("authorization", format!("Bearer {session}")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json(&res)["message"], "Method not allowed");
}

#[tokio::test]
async fn shutdown_stops_the_sweeper_and_empties_the_cache() {
    let (_clock, server) = server_with(100).await;
    let session = session_for(&server);
    send(&server, get("/api/profile", Some(&session))).await;
    assert_eq!(server.cache.len(), 1);

    tokio::time::timeout(Duration::from_secs(5), server.shutdown())
        .await
        .expect("Shutdown should finish promptly.");
    assert!(server.cache.is_empty());
}
