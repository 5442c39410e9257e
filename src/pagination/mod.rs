//! Pagination module
//!
//! Cursor pagination over Relay-style connections:
//! `{ edges: [{ node }], pageInfo: { hasNextPage, endCursor } }`, or the flat
//! `nodes` / `items` forms.
//!
//! # Overview
//!
//! `PaginationWalker` repeatedly calls the request engine with an advancing
//! `after` cursor, appending each page's nodes until the server reports no
//! further pages or the `max_pages` safety valve trips.

mod path;
mod types;
mod walker;

pub use path::{extract_connection, resolve_path};
pub use types::{
    CollectionQuery, Connection, NextPage, PageCollection, PageInfo, PaginationOptions,
    PaginationState, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
};
pub use walker::PaginationWalker;

#[cfg(test)]
mod tests;
