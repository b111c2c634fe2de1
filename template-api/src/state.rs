use std::sync::Arc;

use crate::config::Config;
use crate::connector::{connect_cache, connect_database};
use crate::registry::{AvailabilityRegistry, BackendKind};

#[derive(Clone)]
pub struct State {
    pub registry: Arc<AvailabilityRegistry>,
    pub cors_origins: Vec<String>,
    pub enable_metrics: bool,
}

impl State {
    /// Connect both backends. Infallible: a backend that cannot be reached
    /// is simply registered as unavailable.
    pub async fn from_config(config: &Config) -> Self {
        let cache = connect_cache(config).await;
        let database = connect_database(config);
        let registry = Arc::new(AvailabilityRegistry::new(cache, database));

        tracing::info!(
            redis_available = registry.is_available(BackendKind::Cache),
            supabase_available = registry.is_available(BackendKind::Database),
            "backends initialized"
        );

        State {
            registry,
            cors_origins: config.cors_origins(),
            enable_metrics: config.enable_metrics,
        }
    }
}
