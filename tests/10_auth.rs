mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::{TestServer, EXPIRED_KEY, INACTIVE_KEY, USER_KEY};

async fn assert_unauthorized(res: reqwest::Response, message: &str) -> Result<()> {
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "unexpected status: {}", res.status());
    assert!(res.headers().get("x-ratelimit-limit").is_none());
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "error", "body: {}", body);
    assert_eq!(body["message"], message, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn missing_header_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server.client.get(server.url("/v1/profile")).send().await?;
    assert_unauthorized(res, "Authorization header is required").await
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server
        .client
        .get(server.url("/v1/profile"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_unauthorized(res, "Invalid authorization format. Use Bearer token").await
}

#[tokio::test]
async fn empty_token_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server
        .client
        .get(server.url("/v1/profile"))
        .header("Authorization", "Bearer ")
        .send()
        .await?;
    assert_unauthorized(res, "Token is required").await
}

#[tokio::test]
async fn unknown_inactive_and_expired_keys_are_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    for key in ["does-not-exist", INACTIVE_KEY, EXPIRED_KEY] {
        let res = server.get_with_key("/v1/profile", key).await?;
        assert_unauthorized(res, "Invalid or expired token").await?;
    }
    // rejected credentials never reach the limiter
    assert_eq!(server.state.limiter.tracked_keys(), 0);
    Ok(())
}

#[tokio::test]
async fn valid_key_returns_profile_without_secret() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server.get_with_key("/v1/profile", USER_KEY).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["email"], "john@example.com");
    assert_eq!(body["data"]["rate_limit"], 120);
    assert_eq!(body["data"]["group"]["name"], "user");
    assert!(body["data"].get("api_key").is_none(), "api key leaked: {}", body);
    Ok(())
}
