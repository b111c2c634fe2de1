use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use common_redis::MockRedisClient;
use common_supabase::MockSupabaseClient;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::registry::{
    AvailabilityRegistry, BackendHandle, BackendKind, CacheConnection, DatabaseConnection,
};
use crate::router::router;

/// Registry over mocks; `None` leaves that backend unavailable.
pub fn mock_registry(
    cache: Option<MockRedisClient>,
    database: Option<MockSupabaseClient>,
) -> Arc<AvailabilityRegistry> {
    let cache = match cache {
        Some(client) => {
            let connection: CacheConnection = Arc::new(client);
            BackendHandle::available(BackendKind::Cache, connection)
        }
        None => BackendHandle::unavailable(BackendKind::Cache),
    };
    let database = match database {
        Some(client) => {
            let connection: DatabaseConnection = Arc::new(client);
            BackendHandle::available(BackendKind::Database, connection)
        }
        None => BackendHandle::unavailable(BackendKind::Database),
    };

    Arc::new(AvailabilityRegistry::new(cache, database))
}

pub fn mock_router(
    cache: Option<MockRedisClient>,
    database: Option<MockSupabaseClient>,
) -> Router {
    router(
        mock_registry(cache, database),
        &["http://localhost:3000".to_string()],
        false,
    )
}

/// Send one request through the router and decode the JSON response.
pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}
