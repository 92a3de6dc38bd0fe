mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{header_num, TestServer, ADMIN_KEY, USER_KEY};

#[tokio::test]
async fn user_group_cannot_manage_access() -> Result<()> {
    let server = TestServer::spawn().await?;
    let john = server.identity(USER_KEY).await?;

    let res = server
        .client
        .put(server.url(&format!("/v1/access/{}/rate-limit", john.id)))
        .bearer_auth(USER_KEY)
        .json(&json!({ "rate_limit": 10000 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    // the limiter ran before the permission gate
    assert_eq!(header_num(&res, "x-ratelimit-remaining"), Some(119));
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Access denied: Insufficient permissions");

    assert_eq!(server.identity(USER_KEY).await?.rate_limit, 120);
    Ok(())
}

#[tokio::test]
async fn identity_without_group_is_forbidden() -> Result<()> {
    let server = TestServer::spawn().await?;
    let mut orphan = server.add_user("orphan-key", 10).await?;
    orphan.group = None;
    orphan.group_id = None;
    server.store.insert(orphan);

    let res = server.get_with_key("/v1/profile", "orphan-key").await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Access denied: No group assigned");
    Ok(())
}

#[tokio::test]
async fn admin_group_passes_both_gates() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get_with_key("/v1/profile", ADMIN_KEY).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header_num(&res, "x-ratelimit-limit"), Some(1000));

    let john = server.identity(USER_KEY).await?;
    let res = server
        .client
        .put(server.url(&format!("/v1/access/{}/rate-limit", john.id)))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({ "rate_limit": 30 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
