use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common_redis::{Client as RedisClientTrait, CustomRedisError, RedisClient};
use common_supabase::SupabaseClient;
use tracing::{error, info, warn};
use url::Url;

use crate::config::Config;
use crate::metrics_utils::set_backend_available;
use crate::registry::{BackendHandle, BackendKind, CacheConnection, DatabaseConnection};

/// Connect to the cache and probe it once.
///
/// Never fails: any error, including the connect timeout expiring, yields an
/// unavailable handle.
pub async fn connect_cache(config: &Config) -> BackendHandle<CacheConnection> {
    let timeout = config.backend_connect_timeout();
    info!(
        url = %redact_url(&config.redis_url),
        timeout_secs = timeout.as_secs(),
        "Redis: initializing connection"
    );

    let connect = RedisClient::with_config(config.redis_url.clone(), Some(timeout), Some(timeout));
    cache_handle(connect, timeout).await
}

/// Turn a pending cache connection into a handle. The whole connect + PING
/// sequence shares one `timeout`.
pub async fn cache_handle<F, C>(connect: F, timeout: Duration) -> BackendHandle<CacheConnection>
where
    F: Future<Output = Result<C, CustomRedisError>>,
    C: RedisClientTrait + Send + Sync + 'static,
{
    let attempt = async {
        let client = connect.await?;
        client.ping().await?;
        Ok::<_, CustomRedisError>(client)
    };

    let result = tokio::time::timeout(timeout, attempt)
        .await
        .unwrap_or_else(|elapsed| Err(elapsed.into()));

    match result {
        Ok(client) => {
            info!("Redis: connected and ready");
            set_backend_available(BackendKind::Cache, true);
            let connection: CacheConnection = Arc::new(client);
            BackendHandle::available(BackendKind::Cache, connection)
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Redis: connection failed");
            warn!("Redis: continuing without cache (graceful degradation)");
            set_backend_available(BackendKind::Cache, false);
            BackendHandle::unavailable(BackendKind::Cache)
        }
    }
}

/// Build the database client from configuration.
///
/// The REST client is lazy, so this only validates the endpoint and
/// credential; nothing is sent until the first query.
pub fn connect_database(config: &Config) -> BackendHandle<DatabaseConnection> {
    let (Some(url), Some(key)) = (config.supabase_url(), config.supabase_credential()) else {
        warn!("Supabase: missing credentials (SUPABASE_URL or SUPABASE_KEY)");
        warn!("Supabase: continuing without database");
        set_backend_available(BackendKind::Database, false);
        return BackendHandle::unavailable(BackendKind::Database);
    };

    info!(url = %redact_url(url), "Supabase: initializing client");

    match SupabaseClient::new(url, key, Some(config.backend_connect_timeout())) {
        Ok(client) => {
            info!("Supabase: client initialized and ready");
            set_backend_available(BackendKind::Database, true);
            let connection: DatabaseConnection = Arc::new(client);
            BackendHandle::available(BackendKind::Database, connection)
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Supabase: initialization failed");
            warn!("Supabase: continuing without database (graceful degradation)");
            set_backend_available(BackendKind::Database, false);
            BackendHandle::unavailable(BackendKind::Database)
        }
    }
}

/// Mask any credentials embedded in a connection URL before logging it.
pub fn redact_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return "<unparseable url>".to_string();
    };

    if url.password().is_some() && url.set_password(Some("***")).is_err() {
        return "<unredactable url>".to_string();
    }
    if !url.username().is_empty() && url.set_username("***").is_err() {
        return "<unredactable url>".to_string();
    }
    url.to_string()
}
