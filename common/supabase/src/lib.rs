//! Minimal client for a hosted Postgres exposed through PostgREST (Supabase).
//!
//! Queries are built with the fluent [`Query`] builder and run through any
//! [`Client`]:
//!
//! ```no_run
//! use common_supabase::{Client, Query, SupabaseClient};
//!
//! # async fn example() -> Result<(), common_supabase::CustomSupabaseError> {
//! let client = SupabaseClient::new("https://project.supabase.co", "service-role-key", None)?;
//! let response = Query::table("users")
//!     .select("*")
//!     .eq("role", "admin")
//!     .order("created_at", true)
//!     .limit(10)
//!     .execute(&client)
//!     .await?;
//! println!("{} rows", response.data.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

mod client;
mod mock;
mod query;

pub use client::SupabaseClient;
pub use mock::MockSupabaseClient;
pub use query::{Operation, Query};

#[derive(Error, Debug, Clone)]
pub enum CustomSupabaseError {
    #[error("Request timed out")]
    Timeout,
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Connection error: {0}")]
    Transport(String),
    #[error("Supabase returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CustomSupabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CustomSupabaseError::Timeout
        } else if err.is_decode() {
            CustomSupabaseError::Decode(err.to_string())
        } else if err.is_builder() {
            CustomSupabaseError::InvalidConfiguration(err.to_string())
        } else {
            CustomSupabaseError::Transport(err.to_string())
        }
    }
}

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl CustomSupabaseError {
    /// Classify a non-success HTTP response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: PostgrestErrorBody = serde_json::from_str(body).unwrap_or_default();

        let mut message = match (parsed.code, parsed.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message,
            _ if !body.is_empty() => body.to_string(),
            _ => format!("HTTP {status}"),
        };
        if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
            message = format!("{message} ({details})");
        }
        if let Some(hint) = parsed.hint.filter(|h| !h.is_empty()) {
            message = format!("{message} hint: {hint}");
        }

        match status {
            401 | 403 => CustomSupabaseError::Authentication(message),
            404 => CustomSupabaseError::NotFound(message),
            408 | 504 => CustomSupabaseError::Timeout,
            _ => CustomSupabaseError::Api { status, message },
        }
    }

    /// Stable, low-cardinality label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CustomSupabaseError::Timeout => "timeout",
            CustomSupabaseError::Authentication(_) => "auth",
            CustomSupabaseError::NotFound(_) => "not_found",
            CustomSupabaseError::Transport(_) => "transport",
            CustomSupabaseError::Api { .. } => "api",
            CustomSupabaseError::InvalidConfiguration(_) => "invalid_configuration",
            CustomSupabaseError::Decode(_) => "decode",
        }
    }

    /// True when the server answered, i.e. the backend is reachable even though
    /// this particular request was rejected.
    pub fn is_server_response(&self) -> bool {
        matches!(
            self,
            CustomSupabaseError::NotFound(_) | CustomSupabaseError::Api { .. }
        )
    }
}

/// Rows returned by a query. Writes return the affected rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub data: Vec<Value>,
}

impl QueryResponse {
    pub fn from_body(body: &[u8]) -> Result<Self, CustomSupabaseError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(QueryResponse::default());
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| CustomSupabaseError::Decode(e.to_string()))?;

        let data = match value {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            row => vec![row],
        };
        Ok(QueryResponse { data })
    }
}

#[async_trait]
pub trait Client {
    async fn execute(&self, query: Query) -> Result<QueryResponse, CustomSupabaseError>;

    /// Project URL the client was created for.
    fn url(&self) -> &str;
}
