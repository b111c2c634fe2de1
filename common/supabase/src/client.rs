use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::{Client, CustomSupabaseError, Operation, Query, QueryResponse};

const REST_PATH: &str = "rest/v1";

pub struct SupabaseClient {
    http: reqwest::Client,
    url: String,
    rest_url: Url,
}

impl SupabaseClient {
    /// Build a client for `url` authenticated with `key`.
    ///
    /// Like the hosted client libraries this is lazy: the URL and key are
    /// validated and the HTTP client is configured, but nothing is sent.
    /// `connect_timeout` bounds TCP/TLS connection setup for every request.
    pub fn new(
        url: &str,
        key: &str,
        connect_timeout: Option<Duration>,
    ) -> Result<SupabaseClient, CustomSupabaseError> {
        let parsed = Url::parse(url).map_err(|e| {
            CustomSupabaseError::InvalidConfiguration(format!("invalid Supabase URL: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CustomSupabaseError::InvalidConfiguration(format!(
                "unsupported Supabase URL scheme: {}",
                parsed.scheme()
            )));
        }
        if key.trim().is_empty() {
            return Err(CustomSupabaseError::InvalidConfiguration(
                "Supabase key is empty".to_string(),
            ));
        }

        let rest_url = Url::parse(&format!("{}/{REST_PATH}", url.trim_end_matches('/')))
            .map_err(|e| CustomSupabaseError::InvalidConfiguration(e.to_string()))?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(key)
            .map_err(|e| CustomSupabaseError::InvalidConfiguration(format!("invalid key: {e}")))?;
        api_key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| CustomSupabaseError::InvalidConfiguration(format!("invalid key: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build()?;

        Ok(SupabaseClient {
            http,
            url: url.to_string(),
            rest_url,
        })
    }

    fn endpoint(&self, table: &str) -> Result<Url, CustomSupabaseError> {
        let mut endpoint = self.rest_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| {
                CustomSupabaseError::InvalidConfiguration(format!(
                    "cannot build a table URL from {}",
                    self.rest_url
                ))
            })?
            .push(table);
        Ok(endpoint)
    }
}

fn http_method(operation: &Operation) -> Method {
    match operation {
        Operation::Select { .. } => Method::GET,
        Operation::Insert(_) => Method::POST,
        Operation::Update(_) => Method::PATCH,
        Operation::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Client for SupabaseClient {
    async fn execute(&self, query: Query) -> Result<QueryResponse, CustomSupabaseError> {
        let endpoint = self.endpoint(query.table_name())?;
        let method = http_method(query.operation());
        debug!(table = query.table_name(), %method, "executing supabase query");

        let mut request = self
            .http
            .request(method, endpoint)
            .query(&query.to_query_params());
        if query.is_write() {
            request = request.header("Prefer", "return=representation");
        }
        if let Some(body) = query.body() {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CustomSupabaseError::from_response(status.as_u16(), &body));
        }

        let body = response.bytes().await?;
        QueryResponse::from_body(&body)
    }

    fn url(&self) -> &str {
        &self.url
    }
}
