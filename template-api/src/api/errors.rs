use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use common_redis::CustomRedisError;
use common_supabase::CustomSupabaseError;
use serde::Serialize;
use thiserror::Error;

use crate::registry::BackendKind;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", .0.unavailable_detail())]
    BackendUnavailable(BackendKind),
    #[error("{context}: {source}")]
    CacheOperation {
        context: String,
        source: CustomRedisError,
    },
    #[error("{context}: {source}")]
    DatabaseOperation {
        context: String,
        source: CustomSupabaseError,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn cache(context: impl Into<String>, source: CustomRedisError) -> Self {
        ApiError::CacheOperation {
            context: context.into(),
            source,
        }
    }

    pub fn database(context: impl Into<String>, source: CustomSupabaseError) -> Self {
        ApiError::DatabaseOperation {
            context: context.into(),
            source,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::CacheOperation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseOperation {
                source: CustomSupabaseError::NotFound(_),
                ..
            } => StatusCode::NOT_FOUND,
            ApiError::DatabaseOperation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        }

        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
