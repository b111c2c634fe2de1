use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

pub const SERVICE_NAME: &str = "API Template";
pub const CACHE_TEST_KEY: &str = "test:connection";
pub const CACHE_TEST_VALUE: &str = "API + Redis working!";
pub const CACHE_TEST_TTL_SECS: u64 = 60;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub docs: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RouteDoc {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DocsResponse {
    pub routes: Vec<RouteDoc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

/// Result of probing one backend during a health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// The probe succeeded.
    Connected,
    /// The backend answered but rejected the probe request.
    Initialized,
    /// No connection was established at startup.
    Unavailable,
    /// Unreachable, timed out or refused credentials.
    Error(String),
}

impl BackendStatus {
    /// Whether the backend answered at all.
    pub fn responded(&self) -> bool {
        matches!(self, BackendStatus::Connected | BackendStatus::Initialized)
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendStatus::Connected => write!(f, "connected"),
            BackendStatus::Initialized => write!(f, "initialized"),
            BackendStatus::Unavailable => write!(f, "unavailable"),
            BackendStatus::Error(detail) => write!(f, "error: {detail}"),
        }
    }
}

impl Serialize for BackendStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: OverallStatus,
    pub redis: BackendStatus,
    pub supabase: BackendStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheAction {
    None,
    SetAndGet,
    Set,
    Get,
    Delete,
}

#[derive(Debug, Serialize)]
pub struct CacheTestResponse {
    pub action: CacheAction,
    pub key: String,
    pub value: Option<String>,
    pub cached: bool,
    pub redis_available: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheSetResponse {
    pub action: CacheAction,
    pub key: String,
    pub value: String,
    pub ttl: u64,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheGetResponse {
    pub action: CacheAction,
    pub key: String,
    pub value: Option<String>,
    pub found: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheDeleteResponse {
    pub action: CacheAction,
    pub key: String,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetCacheParams {
    pub value: String,
    #[serde(default = "default_cache_ttl")]
    pub ttl: u64,
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SupabaseTestResponse {
    Unavailable {
        supabase_available: bool,
        message: &'static str,
        details: &'static str,
    },
    Available {
        supabase_available: bool,
        message: &'static str,
        url: String,
        note: &'static str,
    },
}

impl SupabaseTestResponse {
    pub fn unavailable() -> Self {
        SupabaseTestResponse::Unavailable {
            supabase_available: false,
            message: "Supabase client not initialized",
            details: "Check SUPABASE_URL and SUPABASE_KEY environment variables",
        }
    }

    pub fn available(url: &str) -> Self {
        SupabaseTestResponse::Available {
            supabase_available: true,
            message: "Supabase client initialized successfully",
            url: url.to_string(),
            note: "To test database operations, create a table and use the /supabase/tables routes",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TableRowsResponse {
    pub table: String,
    pub count: usize,
    pub data: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct TableRowResponse {
    pub table: String,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct TableDeleteResponse {
    pub table: String,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct IdColumnParams {
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

fn default_id_column() -> String {
    "id".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_status_serializes_as_string() {
        let health = HealthResponse {
            status: OverallStatus::Degraded,
            redis: BackendStatus::Error("Connection error: refused".to_string()),
            supabase: BackendStatus::Unavailable,
            message: "API is running (no services connected)".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&health).unwrap(),
            json!({
                "status": "degraded",
                "redis": "error: Connection error: refused",
                "supabase": "unavailable",
                "message": "API is running (no services connected)",
            })
        );
    }

    #[test]
    fn test_only_answering_backends_count_as_responded() {
        assert!(BackendStatus::Connected.responded());
        assert!(BackendStatus::Initialized.responded());
        assert!(!BackendStatus::Unavailable.responded());
        assert!(!BackendStatus::Error("timeout".to_string()).responded());
    }

    #[test]
    fn test_cache_action_names() {
        assert_eq!(
            serde_json::to_value(CacheAction::SetAndGet).unwrap(),
            json!("set_and_get")
        );
        assert_eq!(serde_json::to_value(CacheAction::None).unwrap(), json!("none"));
    }
}
