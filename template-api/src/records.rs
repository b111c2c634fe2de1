//! Generic table CRUD helpers over the database backend.
//!
//! Each helper checks availability through the registry, runs exactly one
//! query and translates the outcome into an [`ApiError`].

use common_supabase::{Client as _, Query, QueryResponse};
use serde_json::{Map, Value};

use crate::api::errors::ApiError;
use crate::metrics_utils::record_backend_operation;
use crate::registry::{AvailabilityRegistry, BackendKind, DatabaseConnection};

pub const DEFAULT_LIMIT: usize = 100;

/// The database connection, or `BackendUnavailable` if there is none.
pub fn require_database<'a>(
    registry: &'a AvailabilityRegistry,
    operation: &'static str,
) -> Result<&'a DatabaseConnection, ApiError> {
    registry.database().ok_or_else(|| {
        record_backend_operation(BackendKind::Database, operation, "unavailable");
        ApiError::BackendUnavailable(BackendKind::Database)
    })
}

async fn run(
    registry: &AvailabilityRegistry,
    operation: &'static str,
    context: String,
    query: Query,
) -> Result<QueryResponse, ApiError> {
    let client = require_database(registry, operation)?;

    match client.execute(query).await {
        Ok(response) => {
            record_backend_operation(BackendKind::Database, operation, "ok");
            Ok(response)
        }
        Err(e) => {
            record_backend_operation(BackendKind::Database, operation, e.kind());
            Err(ApiError::database(context, e))
        }
    }
}

pub async fn select_all(
    registry: &AvailabilityRegistry,
    table: &str,
    limit: usize,
) -> Result<Vec<Value>, ApiError> {
    let query = Query::table(table).select("*").limit(limit);
    let response = run(registry, "select", format!("Failed to query {table}"), query).await?;
    Ok(response.data)
}

pub async fn select_by_id(
    registry: &AvailabilityRegistry,
    table: &str,
    id: &str,
    id_column: &str,
) -> Result<Option<Value>, ApiError> {
    let query = Query::table(table).select("*").eq(id_column, id).limit(1);
    let response = run(registry, "select", format!("Failed to query {table}"), query).await?;
    Ok(response.data.into_iter().next())
}

/// Insert one row, returning it with any generated columns. A backend that
/// returns nothing yields an empty object.
pub async fn insert_record(
    registry: &AvailabilityRegistry,
    table: &str,
    data: Map<String, Value>,
) -> Result<Value, ApiError> {
    let query = Query::table(table).insert(Value::Object(data));
    let response = run(
        registry,
        "insert",
        format!("Failed to insert into {table}"),
        query,
    )
    .await?;

    Ok(response
        .data
        .into_iter()
        .next()
        .unwrap_or_else(|| Value::Object(Map::new())))
}

pub async fn update_record(
    registry: &AvailabilityRegistry,
    table: &str,
    id: &str,
    data: Map<String, Value>,
    id_column: &str,
) -> Result<Value, ApiError> {
    let query = Query::table(table)
        .update(Value::Object(data))
        .eq(id_column, id);
    let response = run(registry, "update", format!("Failed to update {table}"), query).await?;

    response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound(format!("Record not found in {table}")))
}

pub async fn delete_record(
    registry: &AvailabilityRegistry,
    table: &str,
    id: &str,
    id_column: &str,
) -> Result<(), ApiError> {
    let query = Query::table(table).delete().eq(id_column, id);
    let response = run(
        registry,
        "delete",
        format!("Failed to delete from {table}"),
        query,
    )
    .await?;

    if response.data.is_empty() {
        return Err(ApiError::NotFound(format!("Record not found in {table}")));
    }
    Ok(())
}

/// Select with equality filters on every `(column, value)` pair.
pub async fn query_with_filter(
    registry: &AvailabilityRegistry,
    table: &str,
    filters: &[(String, String)],
    limit: usize,
    order_by: Option<&str>,
    ascending: bool,
) -> Result<Vec<Value>, ApiError> {
    let mut query = Query::table(table).select("*");
    for (column, value) in filters {
        query = query.eq(column.as_str(), value);
    }
    if let Some(column) = order_by {
        query = query.order(column, !ascending);
    }
    let query = query.limit(limit);

    let response = run(registry, "select", format!("Failed to query {table}"), query).await?;
    Ok(response.data)
}
