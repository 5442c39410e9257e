//! Pagination types
//!
//! Options, cursor state, and the Relay connection shape the walker reads.

use crate::error::{Error, Result};
use crate::http::RequestOptions;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// Default number of items requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default safety valve on page count
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Options for one pagination walk
#[derive(Debug, Clone)]
pub struct PaginationOptions {
    /// Value sent in the page-size variable
    pub page_size: u32,
    /// Stop after this many pages even if the server reports more
    pub max_pages: u32,
    /// Name of the page-size variable
    pub page_size_variable: String,
    /// Name of the cursor variable
    pub cursor_variable: String,
    /// Options passed to every engine call
    pub request: RequestOptions,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            page_size_variable: "first".to_string(),
            cursor_variable: "after".to_string(),
            request: RequestOptions::default(),
        }
    }
}

impl PaginationOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the safety valve
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Rename the page-size and cursor variables
    #[must_use]
    pub fn variables(mut self, page_size: impl Into<String>, cursor: impl Into<String>) -> Self {
        self.page_size_variable = page_size.into();
        self.cursor_variable = cursor.into();
        self
    }

    /// Enable verbose progress logging
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.request.verbose = verbose;
        self
    }

    /// Override the retry budget for every page
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.request.max_retries = Some(retries);
        self
    }

    /// Reject zero page sizes and zero page caps
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.max_pages == 0 {
            return Err(Error::invalid_value("max_pages", "must be at least 1"));
        }
        Ok(())
    }
}

/// `pageInfo` of a Relay connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether the server has more items after this page
    #[serde(default)]
    pub has_next_page: bool,
    /// Cursor of the last item on this page
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// Items and page info read from one response
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Item records in server order
    pub items: Vec<JsonValue>,
    /// Absent when the server sent no `pageInfo`
    pub page_info: Option<PageInfo>,
}

/// What the walker does after a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch again from this cursor
    Continue {
        /// Cursor for the next request
        cursor: String,
    },
    /// The server reports no further pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Cursor and accumulated items for one walk
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Cursor for the next request; `None` means from the start
    pub cursor: Option<String>,
    /// Pages fetched so far
    pub pages: u32,
    /// Items accumulated so far, in server order
    pub items: Vec<JsonValue>,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables for the next request: `extra ∪ {page_size, cursor}`
    pub fn variables(&self, extra: &JsonObject, options: &PaginationOptions) -> JsonObject {
        let mut variables = extra.clone();
        variables.insert(
            options.page_size_variable.clone(),
            JsonValue::from(options.page_size),
        );
        variables.insert(
            options.cursor_variable.clone(),
            self.cursor
                .clone()
                .map_or(JsonValue::Null, JsonValue::String),
        );
        variables
    }

    /// Append a page of items and decide whether to continue
    pub fn record_page(&mut self, connection: Connection, collection_path: &str) -> Result<NextPage> {
        self.pages += 1;
        self.items.extend(connection.items);

        match connection.page_info {
            Some(PageInfo {
                has_next_page: true,
                end_cursor: Some(cursor),
            }) => {
                self.cursor = Some(cursor.clone());
                Ok(NextPage::Continue { cursor })
            }
            Some(PageInfo {
                has_next_page: true,
                end_cursor: None,
            }) => Err(Error::shape(
                format!("{collection_path}.pageInfo"),
                "hasNextPage is true but endCursor is missing",
            )),
            _ => Ok(NextPage::Done),
        }
    }

    /// Finish the walk
    pub fn finish(self, truncated: bool) -> PageCollection {
        PageCollection {
            items: self.items,
            pages: self.pages,
            truncated,
        }
    }
}

/// Result of a pagination walk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageCollection {
    /// Every item fetched, in server order
    pub items: Vec<JsonValue>,
    /// Pages fetched
    pub pages: u32,
    /// True when the safety valve stopped the walk before the server did
    pub truncated: bool,
}

impl PageCollection {
    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if no items were fetched
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A complete description of one walk, for batch fetching
#[derive(Debug, Clone)]
pub struct CollectionQuery {
    /// Endpoint URL
    pub endpoint: String,
    /// Query template accepting the page-size and cursor variables
    pub query: String,
    /// Dot path to the connection inside `data`
    pub collection_path: String,
    /// Extra variables sent with every page
    pub variables: JsonObject,
    /// Walk options
    pub options: PaginationOptions,
}

impl CollectionQuery {
    /// Create a query with default options and no extra variables
    pub fn new(
        endpoint: impl Into<String>,
        query: impl Into<String>,
        collection_path: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: query.into(),
            collection_path: collection_path.into(),
            variables: JsonObject::new(),
            options: PaginationOptions::default(),
        }
    }

    /// Set a single extra variable
    #[must_use]
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set the walk options
    #[must_use]
    pub fn options(mut self, options: PaginationOptions) -> Self {
        self.options = options;
        self
    }
}
