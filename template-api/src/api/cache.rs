use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use common_redis::{Client as _, CustomRedisError};
use tracing::{debug, info};

use crate::api::errors::ApiError;
use crate::api::types::{
    CacheAction, CacheDeleteResponse, CacheGetResponse, CacheSetResponse, CacheTestResponse,
    SetCacheParams, CACHE_TEST_KEY, CACHE_TEST_TTL_SECS, CACHE_TEST_VALUE,
};
use crate::metrics_utils::record_backend_operation;
use crate::registry::{AvailabilityRegistry, BackendKind, CacheConnection};
use crate::router::AppState;

fn require_cache<'a>(
    registry: &'a AvailabilityRegistry,
    operation: &'static str,
) -> Result<&'a CacheConnection, ApiError> {
    registry.cache().ok_or_else(|| {
        record_backend_operation(BackendKind::Cache, operation, "unavailable");
        ApiError::BackendUnavailable(BackendKind::Cache)
    })
}

fn record<T>(operation: &'static str, result: &Result<T, CustomRedisError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    record_backend_operation(BackendKind::Cache, operation, outcome);
}

/// Write a fixed key and read it back. Reports rather than fails when the
/// cache is unavailable.
pub async fn cache_test(
    State(state): State<AppState>,
) -> Result<Json<CacheTestResponse>, ApiError> {
    let Some(cache) = state.registry.cache() else {
        record_backend_operation(BackendKind::Cache, "test", "unavailable");
        return Ok(Json(CacheTestResponse {
            action: CacheAction::None,
            key: CACHE_TEST_KEY.to_string(),
            value: None,
            cached: false,
            redis_available: false,
        }));
    };

    let context = "Redis operation failed";

    let set = cache
        .setex(
            CACHE_TEST_KEY.to_string(),
            CACHE_TEST_VALUE.to_string(),
            CACHE_TEST_TTL_SECS,
        )
        .await;
    record("set", &set);
    set.map_err(|e| ApiError::cache(context, e))?;
    info!(key = CACHE_TEST_KEY, value = CACHE_TEST_VALUE, "Redis SET");

    let get = cache.get(CACHE_TEST_KEY.to_string()).await;
    record("get", &get);
    let value = get.map_err(|e| ApiError::cache(context, e))?;
    info!(key = CACHE_TEST_KEY, value = ?value, "Redis GET");

    Ok(Json(CacheTestResponse {
        action: CacheAction::SetAndGet,
        key: CACHE_TEST_KEY.to_string(),
        value,
        cached: true,
        redis_available: true,
    }))
}

pub async fn set_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
    params: Result<Query<SetCacheParams>, QueryRejection>,
) -> Result<Json<CacheSetResponse>, ApiError> {
    let cache = require_cache(&state.registry, "set")?;

    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if params.ttl == 0 {
        return Err(ApiError::BadRequest(
            "ttl must be a positive number of seconds".to_string(),
        ));
    }

    let result = cache
        .setex(key.clone(), params.value.clone(), params.ttl)
        .await;
    record("set", &result);
    result.map_err(|e| ApiError::cache("Failed to set cache", e))?;
    debug!(%key, ttl = params.ttl, "cache entry set");

    Ok(Json(CacheSetResponse {
        action: CacheAction::Set,
        key,
        value: params.value,
        ttl: params.ttl,
        success: true,
    }))
}

pub async fn get_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<CacheGetResponse>, ApiError> {
    let cache = require_cache(&state.registry, "get")?;

    let result = cache.get(key.clone()).await;
    record("get", &result);
    let value = result.map_err(|e| ApiError::cache("Failed to get cache", e))?;

    Ok(Json(CacheGetResponse {
        action: CacheAction::Get,
        found: value.is_some(),
        key,
        value,
    }))
}

pub async fn delete_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<CacheDeleteResponse>, ApiError> {
    let cache = require_cache(&state.registry, "delete")?;

    let result = cache.del(key.clone()).await;
    record("delete", &result);
    let deleted = result.map_err(|e| ApiError::cache("Failed to delete cache", e))?;

    Ok(Json(CacheDeleteResponse {
        action: CacheAction::Delete,
        key,
        deleted,
    }))
}
