use feedgate::application_impl::{ProviderConfig, RealTokenExchangeClient};
use feedgate::application_port::TokenExchangeClient;
use feedgate::domain_model::{AuthorizationCode, ShortLivedToken};
use httpmock::prelude::*;
use std::time::Duration;
use url::Url;

const APP_ID: &str = "app-1234";
const APP_SECRET: &str = "app-secret";
const REDIRECT_URI: &str = "http://localhost:3000/auth/provider/callback";

fn provider_config(server: &MockServer, timeout: Duration) -> ProviderConfig {
    let url = |path: &str| {
        Url::parse(&server.url(path)).expect("Mock provider URL should parse successfully.")
    };
    ProviderConfig {
        app_id: APP_ID.to_string(),
        app_secret: APP_SECRET.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
        scope: "user_profile,user_media".to_string(),
        authorize_url: url("/oauth/authorize"),
        token_url: url("/oauth/access_token"),
        long_lived_token_url: url("/access_token"),
        graph_url: url("/"),
        timeout,
    }
}

fn client(server: &MockServer) -> RealTokenExchangeClient {
    let config = provider_config(server, Duration::from_secs(5));
    let http = config
        .http_client()
        .expect("Provider HTTP client should build.");
    RealTokenExchangeClient::new(http, config)
}

#[tokio::test]
async fn exchange_code_posts_form_and_reads_numeric_user_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/oauth/access_token")
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"access_token":"short-lived","user_id":17841400}"#);
        })
        .await;

    let token = client(&server)
        .exchange_code(&AuthorizationCode("code-abc".to_string()))
        .await
        .expect("Code exchange should succeed.");

    mock.assert_async().await;
    assert_eq!(token.access_token, "short-lived");
    assert_eq!(token.user_id.as_deref(), Some("17841400"));
}

#[tokio::test]
async fn upgrade_sends_exchange_grant_and_secret() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/access_token")
                .query_param("grant_type", "ig_exchange_token")
                .query_param("client_secret", APP_SECRET)
                .query_param("access_token", "short-lived");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"access_token":"long-lived","token_type":"bearer","expires_in":5183944}"#);
        })
        .await;

    let short = ShortLivedToken {
        access_token: "short-lived".to_string(),
        user_id: None,
    };
    let token = client(&server)
        .upgrade_to_long_lived(&short)
        .await
        .expect("Long-lived upgrade should succeed.");

    mock.assert_async().await;
    assert_eq!(token.access_token, "long-lived");
    assert_eq!(token.token_type.as_deref(), Some("bearer"));
    assert_eq!(token.expires_in, Some(5_183_944));
}

#[tokio::test]
async fn refresh_sends_refresh_grant() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/access_token")
                .query_param("grant_type", "ig_refresh_token")
                .query_param("access_token", "long-lived");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"access_token":"long-lived-2","token_type":"bearer","expires_in":5184000}"#);
        })
        .await;

    let token = client(&server)
        .refresh("long-lived")
        .await
        .expect("Token refresh should succeed.");

    mock.assert_calls_async(1).await;
    assert_eq!(token.access_token, "long-lived-2");
}

#[tokio::test]
async fn provider_error_keeps_status_and_message() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/access_token");
            then.status(400)
                .header("content-type", "application/json")
                .body(r#"{"error_type":"OAuthException","code":400,"error_message":"This authorization code has been used"}"#);
        })
        .await;

    let err = client(&server)
        .exchange_code(&AuthorizationCode("used".to_string()))
        .await
        .expect_err("A used code should be rejected.");

    mock.assert_async().await;
    assert_eq!(err.operation, "exchange_code");
    assert_eq!(err.status, Some(400));
    assert_eq!(err.detail, "This authorization code has been used");
}

#[tokio::test]
async fn undecodable_success_body_is_an_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/access_token");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let err = client(&server)
        .refresh("long-lived")
        .await
        .expect_err("An HTML body should not decode as a token.");

    assert_eq!(err.operation, "refresh_token");
    assert!(err.detail.starts_with("unexpected response body"));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/access_token");
            then.status(200)
                .delay(Duration::from_secs(3))
                .body(r#"{"access_token":"late"}"#);
        })
        .await;

    let config = provider_config(&server, Duration::from_millis(200));
    let http = config
        .http_client()
        .expect("Provider HTTP client should build.");
    let err = RealTokenExchangeClient::new(http, config)
        .refresh("long-lived")
        .await
        .expect_err("The request should time out.");

    assert_eq!(err.status, None);
    assert_eq!(err.detail, "request timed out");
}
