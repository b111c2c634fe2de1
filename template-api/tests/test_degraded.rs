use anyhow::Result;
use assert_json_diff::assert_json_eq;
use httpmock::prelude::*;
use serde_json::{json, Value};
use template_api::config::Config;

use crate::helpers::*;

pub mod helpers;

fn with_supabase(server: &MockServer) -> Config {
    Config {
        supabase_url: Some(server.base_url()),
        supabase_service_role_key: Some("service-role-key".to_string()),
        ..offline_config()
    }
}

#[tokio::test]
async fn starts_and_reports_degraded_without_backends() -> Result<()> {
    let server = ServerHandle::for_config(offline_config()).await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/health")).send().await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_json_eq!(
        body,
        json!({
            "status": "degraded",
            "redis": "unavailable",
            "supabase": "unavailable",
            "message": "API is running (no services connected)",
        })
    );

    let response = client.get(server.url("/")).send().await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["name"], "API Template");

    Ok(())
}

#[tokio::test]
async fn cache_routes_degrade_when_redis_is_unreachable() -> Result<()> {
    let server = ServerHandle::for_config(offline_config()).await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/redis/test")).send().await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["redis_available"], false);
    assert_eq!(body["action"], "none");

    let responses = [
        client
            .post(server.url("/redis/cache/foo?value=bar"))
            .send()
            .await?,
        client.get(server.url("/redis/cache/foo")).send().await?,
        client.delete(server.url("/redis/cache/foo")).send().await?,
    ];
    for response in responses {
        assert_eq!(response.status(), 503);
        let body: Value = response.json().await?;
        assert_eq!(body["detail"], "Redis is not available");
    }

    Ok(())
}

#[tokio::test]
async fn supabase_routes_degrade_without_configuration() -> Result<()> {
    let server = ServerHandle::for_config(offline_config()).await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/supabase/test")).send().await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["supabase_available"], false);
    assert_eq!(body["message"], "Supabase client not initialized");

    let response = client.get(server.url("/supabase/tables/users")).send().await?;
    assert_eq!(response.status(), 503);

    Ok(())
}

#[tokio::test]
async fn health_reports_supabase_initialized_when_probe_table_is_missing() -> Result<()> {
    let supabase = MockServer::start_async().await;
    let probe = supabase
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/_supabase_migrations");
            then.status(404).body(
                r#"{"code":"PGRST205","message":"Could not find the table 'public._supabase_migrations' in the schema cache"}"#,
            );
        })
        .await;

    let server = ServerHandle::for_config(with_supabase(&supabase)).await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/health")).send().await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_json_eq!(
        body,
        json!({
            "status": "healthy",
            "redis": "unavailable",
            "supabase": "initialized",
            "message": "API is running with Supabase",
        })
    );
    probe.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn health_reports_supabase_error_on_bad_credentials() -> Result<()> {
    let supabase = MockServer::start_async().await;
    supabase
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/_supabase_migrations");
            then.status(401).body(r#"{"message":"Invalid API key"}"#);
        })
        .await;

    let server = ServerHandle::for_config(with_supabase(&supabase)).await;
    let client = reqwest::Client::new();

    let body: Value = client.get(server.url("/health")).send().await?.json().await?;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["supabase"], "error: Authentication failed: Invalid API key");

    Ok(())
}

#[tokio::test]
async fn table_crud_passes_through_to_supabase() -> Result<()> {
    let supabase = MockServer::start_async().await;
    let list = supabase
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/todos")
                .query_param("select", "*")
                .query_param("done", "eq.false")
                .query_param("limit", "100")
                .header("apikey", "service-role-key");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"[{"id":1,"title":"write tests","done":false}]"#);
        })
        .await;
    let insert = supabase
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/todos")
                .header("prefer", "return=representation")
                .json_body(json!({"title": "ship it"}));
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"[{"id":2,"title":"ship it","done":false}]"#);
        })
        .await;
    let delete = supabase
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/rest/v1/todos")
                .query_param("id", "eq.2");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"[{"id":2}]"#);
        })
        .await;

    let server = ServerHandle::for_config(with_supabase(&supabase)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/supabase/tables/todos?done=false"))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "write tests");

    let response = client
        .post(server.url("/supabase/tables/todos"))
        .json(&json!({"title": "ship it"}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_json_eq!(
        body,
        json!({"table": "todos", "data": {"id": 2, "title": "ship it", "done": false}})
    );

    let response = client
        .delete(server.url("/supabase/tables/todos/2"))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_json_eq!(body, json!({"table": "todos", "deleted": true}));

    list.assert_async().await;
    insert.assert_async().await;
    delete.assert_async().await;

    let response = client.get(server.url("/supabase/test")).send().await?;
    let body: Value = response.json().await?;
    assert_eq!(body["supabase_available"], true);
    assert_eq!(body["url"], supabase.base_url());

    Ok(())
}
