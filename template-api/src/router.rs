use std::{future::ready, sync::Arc};

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::api::{cache, database, status};
use crate::metrics_utils::{setup_metrics_recorder, track_metrics};
use crate::registry::AvailabilityRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AvailabilityRegistry>,
}

pub fn router(
    registry: Arc<AvailabilityRegistry>,
    cors_origins: &[String],
    enable_metrics: bool,
) -> Router {
    let state = AppState { registry };

    let status_router = Router::new()
        .route("/", get(status::index))
        .route("/docs", get(status::docs))
        .route("/health", get(status::health));

    let cache_router = Router::new()
        .route("/redis/test", get(cache::cache_test))
        .route(
            "/redis/cache/:key",
            post(cache::set_cache)
                .get(cache::get_cache)
                .delete(cache::delete_cache),
        );

    let database_router = Router::new()
        .route("/supabase/test", get(database::supabase_test))
        .route(
            "/supabase/tables/:table",
            get(database::list_rows).post(database::insert_row),
        )
        .route(
            "/supabase/tables/:table/:id",
            get(database::get_row)
                .patch(database::update_row)
                .delete(database::delete_row),
        );

    let router = Router::new()
        .merge(status_router)
        .merge(cache_router)
        .merge(database_router)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .layer(cors_layer(cors_origins))
        .with_state(state);

    // The recorder is process-global, so only install it when asked to
    if enable_metrics {
        let recorder_handle = setup_metrics_recorder();
        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}

/// Credentialed CORS for the configured origins. A `*` entry mirrors whatever
/// origin the request came from, since browsers reject a literal wildcard
/// alongside credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
