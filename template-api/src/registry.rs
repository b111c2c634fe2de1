use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use common_redis::Client as RedisClientTrait;
use common_supabase::Client as SupabaseClientTrait;
use tracing::{error, info};

use crate::metrics_utils::set_backend_available;

// Upper bound for releasing one backend, so a hung close cannot hold up the other
const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

pub type CacheConnection = Arc<dyn RedisClientTrait + Send + Sync>;
pub type DatabaseConnection = Arc<dyn SupabaseClientTrait + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Cache,
    Database,
}

impl BackendKind {
    /// Label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Cache => "redis",
            BackendKind::Database => "supabase",
        }
    }

    /// Message returned to clients when the backend cannot serve a request.
    pub fn unavailable_detail(&self) -> &'static str {
        match self {
            BackendKind::Cache => "Redis is not available",
            BackendKind::Database => "Supabase is not available. Check server configuration.",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cache => write!(f, "Redis"),
            BackendKind::Database => write!(f, "Supabase"),
        }
    }
}

/// How releasing one backend at shutdown went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Closed,
    Failed,
    TimedOut,
}

/// Connection to one backend, or nothing if it could not be established.
///
/// Availability is derived from the connection itself, so an available
/// handle always carries a connection and an unavailable one never does.
pub struct BackendHandle<C> {
    kind: BackendKind,
    connection: Option<C>,
}

impl<C> BackendHandle<C> {
    pub fn available(kind: BackendKind, connection: C) -> Self {
        BackendHandle {
            kind,
            connection: Some(connection),
        }
    }

    pub fn unavailable(kind: BackendKind) -> Self {
        BackendHandle {
            kind,
            connection: None,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn is_available(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }
}

/// Process-wide view of both backends.
///
/// Built once at startup and shared read-only with every handler; the only
/// other thing that touches it is `shutdown`, after the server stopped
/// accepting requests.
pub struct AvailabilityRegistry {
    cache: BackendHandle<CacheConnection>,
    database: BackendHandle<DatabaseConnection>,
}

impl AvailabilityRegistry {
    pub fn new(
        cache: BackendHandle<CacheConnection>,
        database: BackendHandle<DatabaseConnection>,
    ) -> Self {
        debug_assert_eq!(cache.kind(), BackendKind::Cache);
        debug_assert_eq!(database.kind(), BackendKind::Database);

        AvailabilityRegistry { cache, database }
    }

    pub fn is_available(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Cache => self.cache.is_available(),
            BackendKind::Database => self.database.is_available(),
        }
    }

    pub fn cache(&self) -> Option<&CacheConnection> {
        self.cache.connection()
    }

    pub fn database(&self) -> Option<&DatabaseConnection> {
        self.database.connection()
    }

    /// Release both backends. Each release is attempted regardless of how
    /// the other one went; the outcome of every attempted release is returned.
    pub async fn shutdown(&self) -> Vec<(BackendKind, Release)> {
        let mut released = Vec::with_capacity(2);

        if let Some(cache) = self.cache() {
            let outcome = match tokio::time::timeout(RELEASE_TIMEOUT, cache.close()).await {
                Ok(Ok(())) => {
                    info!("Redis: connection closed gracefully");
                    Release::Closed
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Redis: error during shutdown");
                    Release::Failed
                }
                Err(_) => {
                    error!(
                        timeout_secs = RELEASE_TIMEOUT.as_secs(),
                        "Redis: timed out closing connection"
                    );
                    Release::TimedOut
                }
            };
            set_backend_available(BackendKind::Cache, false);
            released.push((BackendKind::Cache, outcome));
        }

        // The REST client holds no session; dropping it is all there is to do
        if self.database().is_some() {
            info!("Supabase: session ended");
            set_backend_available(BackendKind::Database, false);
            released.push((BackendKind::Database, Release::Closed));
        }

        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_redis::{CustomRedisError, MockRedisClient};
    use common_supabase::MockSupabaseClient;

    fn cache_of(client: MockRedisClient) -> BackendHandle<CacheConnection> {
        let connection: CacheConnection = Arc::new(client);
        BackendHandle::available(BackendKind::Cache, connection)
    }

    fn database_of(client: MockSupabaseClient) -> BackendHandle<DatabaseConnection> {
        let connection: DatabaseConnection = Arc::new(client);
        BackendHandle::available(BackendKind::Database, connection)
    }

    #[test]
    fn test_handle_availability_follows_connection() {
        let handle = cache_of(MockRedisClient::new());
        assert!(handle.is_available());
        assert!(handle.connection().is_some());

        let handle: BackendHandle<CacheConnection> = BackendHandle::unavailable(BackendKind::Cache);
        assert!(!handle.is_available());
        assert!(handle.connection().is_none());
    }

    #[test]
    fn test_registry_reports_each_backend_independently() {
        let registry = AvailabilityRegistry::new(
            BackendHandle::unavailable(BackendKind::Cache),
            database_of(MockSupabaseClient::new()),
        );

        assert!(!registry.is_available(BackendKind::Cache));
        assert!(registry.cache().is_none());
        assert!(registry.is_available(BackendKind::Database));
        assert!(registry.database().is_some());
    }

    #[tokio::test]
    async fn test_shutdown_closes_cache() {
        let cache = MockRedisClient::new();
        let registry = AvailabilityRegistry::new(
            cache_of(cache.clone()),
            database_of(MockSupabaseClient::new()),
        );

        let released = registry.shutdown().await;

        assert_eq!(
            released,
            vec![
                (BackendKind::Cache, Release::Closed),
                (BackendKind::Database, Release::Closed),
            ]
        );
        let ops: Vec<String> = cache.get_calls().into_iter().map(|c| c.op).collect();
        assert_eq!(ops, vec!["close"]);
    }

    #[tokio::test]
    async fn test_shutdown_survives_cache_close_failure() {
        let cache = MockRedisClient::new().close_error(CustomRedisError::Timeout);
        let registry = AvailabilityRegistry::new(
            cache_of(cache.clone()),
            database_of(MockSupabaseClient::new()),
        );

        let released = registry.shutdown().await;

        assert_eq!(
            released,
            vec![
                (BackendKind::Cache, Release::Failed),
                (BackendKind::Database, Release::Closed),
            ]
        );
        assert_eq!(cache.get_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_bounds_a_hung_cache_close() {
        let registry = AvailabilityRegistry::new(
            cache_of(MockRedisClient::new().close_hangs()),
            database_of(MockSupabaseClient::new()),
        );

        let started = tokio::time::Instant::now();
        let released = registry.shutdown().await;

        assert!(started.elapsed() >= RELEASE_TIMEOUT);
        assert_eq!(
            released,
            vec![
                (BackendKind::Cache, Release::TimedOut),
                (BackendKind::Database, Release::Closed),
            ]
        );
    }

    #[tokio::test]
    async fn test_shutdown_with_nothing_connected() {
        let registry = AvailabilityRegistry::new(
            BackendHandle::unavailable(BackendKind::Cache),
            BackendHandle::unavailable(BackendKind::Database),
        );

        assert!(registry.shutdown().await.is_empty());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(BackendKind::Cache.to_string(), "Redis");
        assert_eq!(BackendKind::Database.to_string(), "Supabase");
        assert_eq!(BackendKind::Cache.label(), "redis");
        assert_eq!(
            BackendKind::Cache.unavailable_detail(),
            "Redis is not available"
        );
    }
}
