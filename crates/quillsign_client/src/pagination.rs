//! Paged list queries and results.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Largest page the API serves.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when none is requested.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Parameters of a list request.
///
/// Pages are 1-based and the page size is clamped to `1..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    page: u32,
    page_size: u32,
    query: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
        }
    }
}

impl PageQuery {
    /// Queries the first page with the default size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page number; `0` is treated as `1`.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size, clamped to `1..=100`.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Sets a search query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the search query.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(query) = &self.query {
            pairs.push(("query", query.clone()));
        }
        pairs
    }
}

/// Position of a page within a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListInfo {
    /// Current page, 1-based.
    pub page: u32,
    /// Total number of pages.
    pub num_pages: u32,
    /// Total number of results.
    pub num_results: u32,
    /// Results per page.
    pub page_size: u32,
}

/// One page of a list result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Position of this page.
    pub list_info: ListInfo,
}

impl<T> Page<T> {
    /// Returns `true` if later pages exist.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.list_info.page < self.list_info.num_pages
    }

    /// Returns the query for the following page, keeping size and search.
    #[must_use]
    pub fn next_query(&self, current: &PageQuery) -> Option<PageQuery> {
        self.has_next().then(|| {
            current
                .clone()
                .with_page(self.list_info.page.saturating_add(1))
        })
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Reads a page from a `{ "<key>": [...], "list_info": {...} }` body.
    pub(crate) fn from_envelope(mut body: Value, key: &str) -> Result<Self, ClientError> {
        let items = body
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| ClientError::InvalidResponse(format!("missing '{key}'")))?;
        let list_info = body
            .get_mut("list_info")
            .map(Value::take)
            .filter(|info| !info.is_null())
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        Ok(Self {
            items: serde_json::from_value(items)
                .map_err(|err| ClientError::InvalidResponse(format!("'{key}': {err}")))?,
            list_info: serde_json::from_value(list_info)
                .map_err(|err| ClientError::InvalidResponse(format!("'list_info': {err}")))?,
        })
    }
}
