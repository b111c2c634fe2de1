use axum::{extract::State, Json};
use common_redis::Client as _;
use common_supabase::{Client as _, Query};
use tracing::warn;

use crate::api::types::{
    BackendStatus, DocsResponse, HealthResponse, OverallStatus, RouteDoc, ServiceInfo,
    SERVICE_NAME,
};
use crate::metrics_utils::record_backend_operation;
use crate::registry::{AvailabilityRegistry, BackendKind};
use crate::router::AppState;

// Exists on every Supabase project that has run a migration
const DATABASE_PROBE_TABLE: &str = "_supabase_migrations";

pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        docs: "/docs",
        health: "/health",
    })
}

fn route(method: &'static str, path: &'static str, description: &'static str) -> RouteDoc {
    RouteDoc {
        method,
        path,
        description,
    }
}

pub async fn docs() -> Json<DocsResponse> {
    Json(DocsResponse {
        routes: vec![
            route("GET", "/", "Service identity"),
            route("GET", "/docs", "This route table"),
            route("GET", "/health", "Live probe of every backend"),
            route("GET", "/redis/test", "Cache round-trip smoke test"),
            route("POST", "/redis/cache/{key}?value&ttl", "Set a cache entry"),
            route("GET", "/redis/cache/{key}", "Get a cache entry"),
            route("DELETE", "/redis/cache/{key}", "Delete a cache entry"),
            route("GET", "/supabase/test", "Database client presence check"),
            route(
                "GET",
                "/supabase/tables/{table}?limit&order_by&ascending&<column>=<value>",
                "List rows, optionally filtered",
            ),
            route(
                "GET",
                "/supabase/tables/{table}/{id}?id_column",
                "Fetch one row",
            ),
            route("POST", "/supabase/tables/{table}", "Insert a row"),
            route(
                "PATCH",
                "/supabase/tables/{table}/{id}?id_column",
                "Update a row",
            ),
            route(
                "DELETE",
                "/supabase/tables/{table}/{id}?id_column",
                "Delete a row",
            ),
        ],
    })
}

/// Always 200. Both backends are probed concurrently on every call; the
/// registry itself is never changed by a failed probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (redis, supabase) = tokio::join!(
        probe_cache(&state.registry),
        probe_database(&state.registry)
    );

    let services: Vec<String> = [
        (BackendKind::Cache, &redis),
        (BackendKind::Database, &supabase),
    ]
    .into_iter()
    .filter(|(_, status)| status.responded())
    .map(|(kind, _)| kind.to_string())
    .collect();

    let (status, message) = if services.is_empty() {
        (
            OverallStatus::Degraded,
            "API is running (no services connected)".to_string(),
        )
    } else {
        (
            OverallStatus::Healthy,
            format!("API is running with {}", services.join(", ")),
        )
    };

    Json(HealthResponse {
        status,
        redis,
        supabase,
        message,
    })
}

async fn probe_cache(registry: &AvailabilityRegistry) -> BackendStatus {
    let Some(cache) = registry.cache() else {
        return BackendStatus::Unavailable;
    };

    match cache.ping().await {
        Ok(()) => {
            record_backend_operation(BackendKind::Cache, "probe", "ok");
            BackendStatus::Connected
        }
        Err(e) => {
            record_backend_operation(BackendKind::Cache, "probe", e.kind());
            warn!(error = %e, "Redis health check failed");
            BackendStatus::Error(e.to_string())
        }
    }
}

async fn probe_database(registry: &AvailabilityRegistry) -> BackendStatus {
    let Some(database) = registry.database() else {
        return BackendStatus::Unavailable;
    };

    let probe = Query::table(DATABASE_PROBE_TABLE).select("*").limit(1);
    match database.execute(probe).await {
        Ok(_) => {
            record_backend_operation(BackendKind::Database, "probe", "ok");
            BackendStatus::Connected
        }
        Err(e) if e.is_server_response() => {
            record_backend_operation(BackendKind::Database, "probe", e.kind());
            BackendStatus::Initialized
        }
        Err(e) => {
            record_backend_operation(BackendKind::Database, "probe", e.kind());
            warn!(error = %e, "Supabase health check failed");
            BackendStatus::Error(e.to_string())
        }
    }
}
