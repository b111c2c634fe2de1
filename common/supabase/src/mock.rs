use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{Client, CustomSupabaseError, Query, QueryResponse};

/// Canned responses per table; tables without one return no rows.
#[derive(Clone)]
pub struct MockSupabaseClient {
    url: String,
    table_ret: HashMap<String, Result<QueryResponse, CustomSupabaseError>>,
    queries: Arc<Mutex<Vec<Query>>>,
}

impl Default for MockSupabaseClient {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            table_ret: HashMap::new(),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockSupabaseClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_ret(
        mut self,
        table: &str,
        ret: Result<QueryResponse, CustomSupabaseError>,
    ) -> Self {
        self.table_ret.insert(table.to_owned(), ret);
        self
    }

    pub fn get_queries(&self) -> Vec<Query> {
        match self.queries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Client for MockSupabaseClient {
    async fn execute(&self, query: Query) -> Result<QueryResponse, CustomSupabaseError> {
        let ret = self
            .table_ret
            .get(query.table_name())
            .cloned()
            .unwrap_or_else(|| Ok(QueryResponse::default()));

        match self.queries.lock() {
            Ok(mut guard) => guard.push(query),
            Err(poisoned) => poisoned.into_inner().push(query),
        }

        ret
    }

    fn url(&self) -> &str {
        &self.url
    }
}
