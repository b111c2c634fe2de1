use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use common_supabase::Client as _;
use serde_json::{Map, Value};

use crate::api::errors::ApiError;
use crate::api::types::{
    IdColumnParams, SupabaseTestResponse, TableDeleteResponse, TableRowResponse,
    TableRowsResponse,
};
use crate::records::{self, require_database, DEFAULT_LIMIT};
use crate::router::AppState;

/// Presence check only; no query is sent.
pub async fn supabase_test(State(state): State<AppState>) -> Json<SupabaseTestResponse> {
    match state.registry.database() {
        Some(database) => Json(SupabaseTestResponse::available(database.url())),
        None => Json(SupabaseTestResponse::unavailable()),
    }
}

// PostgREST reads these itself, so they cannot double as column filters
const RESERVED_PARAMS: &[&str] = &[
    "select",
    "order",
    "offset",
    "on_conflict",
    "columns",
    "and",
    "or",
];

/// Parameters of a table listing. Anything that is not `limit`, `order_by`
/// or `ascending` is an equality filter.
#[derive(Debug, PartialEq)]
struct ListParams {
    limit: usize,
    order_by: Option<String>,
    ascending: bool,
    filters: Vec<(String, String)>,
}

impl ListParams {
    fn parse(raw: HashMap<String, String>) -> Result<Self, ApiError> {
        let mut params = ListParams {
            limit: DEFAULT_LIMIT,
            order_by: None,
            ascending: true,
            filters: Vec::new(),
        };

        for (name, value) in raw {
            match name.as_str() {
                "limit" => {
                    params.limit = value
                        .parse::<usize>()
                        .ok()
                        .filter(|limit| *limit > 0)
                        .ok_or_else(|| {
                            ApiError::BadRequest(format!("invalid limit: {value}"))
                        })?;
                }
                "order_by" => params.order_by = Some(value).filter(|v| !v.is_empty()),
                "ascending" => {
                    params.ascending = value.parse::<bool>().map_err(|_| {
                        ApiError::BadRequest(format!("invalid ascending flag: {value}"))
                    })?;
                }
                reserved if RESERVED_PARAMS.contains(&reserved) => {
                    return Err(ApiError::BadRequest(format!(
                        "{reserved} is not a filterable column name"
                    )));
                }
                _ => params.filters.push((name, value)),
            }
        }
        // Stable order for the generated query string
        params.filters.sort();

        Ok(params)
    }
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn into_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(ApiError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

pub async fn list_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    raw: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<TableRowsResponse>, ApiError> {
    require_database(&state.registry, "select")?;
    let params = ListParams::parse(query_params(raw)?)?;

    let data = if params.filters.is_empty() && params.order_by.is_none() {
        records::select_all(&state.registry, &table, params.limit).await?
    } else {
        records::query_with_filter(
            &state.registry,
            &table,
            &params.filters,
            params.limit,
            params.order_by.as_deref(),
            params.ascending,
        )
        .await?
    };

    Ok(Json(TableRowsResponse {
        table,
        count: data.len(),
        data,
    }))
}

pub async fn get_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    params: Result<Query<IdColumnParams>, QueryRejection>,
) -> Result<Json<TableRowResponse>, ApiError> {
    require_database(&state.registry, "select")?;
    let params = query_params(params)?;

    let row = records::select_by_id(&state.registry, &table, &id, &params.id_column)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Record not found in {table}")))?;

    Ok(Json(TableRowResponse { table, data: row }))
}

pub async fn insert_row(
    State(state): State<AppState>,
    Path(table): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TableRowResponse>, ApiError> {
    require_database(&state.registry, "insert")?;
    let data = into_object(body)?;

    let row = records::insert_record(&state.registry, &table, data).await?;
    Ok(Json(TableRowResponse { table, data: row }))
}

pub async fn update_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    params: Result<Query<IdColumnParams>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TableRowResponse>, ApiError> {
    require_database(&state.registry, "update")?;
    let params = query_params(params)?;
    let data = into_object(body)?;

    let row =
        records::update_record(&state.registry, &table, &id, data, &params.id_column).await?;
    Ok(Json(TableRowResponse { table, data: row }))
}

pub async fn delete_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    params: Result<Query<IdColumnParams>, QueryRejection>,
) -> Result<Json<TableDeleteResponse>, ApiError> {
    require_database(&state.registry, "delete")?;
    let params = query_params(params)?;

    records::delete_record(&state.registry, &table, &id, &params.id_column).await?;

    Ok(Json(TableDeleteResponse {
        table,
        deleted: true,
    }))
}
