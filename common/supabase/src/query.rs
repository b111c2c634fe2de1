use serde_json::Value;

use crate::{Client, CustomSupabaseError, QueryResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Select { columns: String },
    Insert(Value),
    Update(Value),
    Delete,
}

/// A single table query, built fluently and executed by a [`Client`].
///
/// A fresh query selects every column; `insert`, `update` and `delete`
/// switch the operation. Filters, ordering and limit apply to any operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    operation: Operation,
    filters: Vec<(String, String)>,
    order: Option<(String, bool)>,
    limit: Option<usize>,
}

impl Query {
    pub fn table(name: impl Into<String>) -> Self {
        Query {
            table: name.into(),
            operation: Operation::Select {
                columns: "*".to_string(),
            },
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.operation = Operation::Select {
            columns: columns.into(),
        };
        self
    }

    pub fn insert(mut self, row: Value) -> Self {
        self.operation = Operation::Insert(row);
        self
    }

    pub fn update(mut self, changes: Value) -> Self {
        self.operation = Operation::Update(changes);
        self
    }

    pub fn delete(mut self) -> Self {
        self.operation = Operation::Delete;
        self
    }

    /// Equality filter, `column = value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((column.into(), value.to_string()));
        self
    }

    pub fn order(mut self, column: impl Into<String>, desc: bool) -> Self {
        self.order = Some((column.into(), desc));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub async fn execute<C>(self, client: &C) -> Result<QueryResponse, CustomSupabaseError>
    where
        C: Client + Sync + ?Sized,
    {
        client.execute(self).await
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn is_write(&self) -> bool {
        !matches!(self.operation, Operation::Select { .. })
    }

    pub fn body(&self) -> Option<&Value> {
        match &self.operation {
            Operation::Insert(body) | Operation::Update(body) => Some(body),
            _ => None,
        }
    }

    /// PostgREST query string parameters for this query.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);

        if let Operation::Select { columns } = &self.operation {
            params.push(("select".to_string(), columns.clone()));
        }
        for (column, value) in &self.filters {
            params.push((column.clone(), format!("eq.{value}")));
        }
        if let Some((column, desc)) = &self.order {
            let direction = if *desc { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{column}.{direction}")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}
