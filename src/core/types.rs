use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded::byte_serialize;

/// Query parameters in the fixed order they are signed and sent.
pub type QueryParams = Vec<(&'static str, String)>;

/// One condition of a `query` call, e.g. `{"field":"status","op":"eq","value":"active"}`.
///
/// `op` is passed through as-is; the set of operators is defined by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: String,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// Shorthand for an `eq` condition
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, "eq", value)
    }
}

/// Paging for `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page: u32,
    pub limit: u32,
    pub order_by: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            order_by: None,
        }
    }
}

impl ListOptions {
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(order_by) = &self.order_by {
            params.push(("order_by", order_by.clone()));
        }
        params
    }
}

/// Paging for `query`; same shape and defaults as [`ListOptions`]
pub type QueryOptions = ListOptions;

/// Paging for `history`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    pub page: u32,
    pub limit: u32,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl HistoryOptions {
    pub const fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn to_params(self) -> QueryParams {
        vec![("page", self.page.to_string()), ("limit", self.limit.to_string())]
    }
}

/// Options for `delete`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Overrides the client's active transaction when set
    pub transaction_id: Option<String>,
    pub hard: bool,
}

impl DeleteOptions {
    pub const fn hard(mut self, hard: bool) -> Self {
        self.hard = hard;
        self
    }

    pub fn transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn to_params(&self) -> QueryParams {
        if self.hard {
            vec![("hard", "true".to_string())]
        } else {
            Vec::new()
        }
    }
}

/// Join params as `k=v` pairs, form-encoding each value.
///
/// The result is what gets signed, so it must already be in the form the URL
/// parser leaves untouched.
#[must_use]
pub fn build_query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", byte_serialize(v.as_bytes()).collect::<String>()))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append a query string to `path`, leaving it untouched when there are no params.
#[must_use]
pub fn with_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, build_query_string(params))
    }
}
