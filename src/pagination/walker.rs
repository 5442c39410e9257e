//! Pagination walker
//!
//! Drives the request engine page by page, advancing the cursor from each
//! response's `pageInfo`. Pages of one walk are strictly sequential; separate
//! walks share nothing and can run concurrently.

use super::path::extract_connection;
use super::types::{CollectionQuery, NextPage, PageCollection, PaginationOptions, PaginationState};
use crate::error::{Error, Result};
use crate::http::{GraphqlRequest, RequestEngine};
use crate::types::JsonObject;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

/// Assembles cursor-paginated collections
#[derive(Debug, Clone)]
pub struct PaginationWalker {
    engine: RequestEngine,
}

impl PaginationWalker {
    /// Create a walker over an engine
    pub fn new(engine: RequestEngine) -> Self {
        Self { engine }
    }

    /// Get the underlying engine
    pub fn engine(&self) -> &RequestEngine {
        &self.engine
    }

    /// Fetch every page of the connection at `collection_path`.
    ///
    /// Any application error aborts the walk and discards what was gathered.
    /// Hitting `max_pages` is not an error: the result is marked truncated.
    pub async fn fetch_all_pages(
        &self,
        endpoint: &str,
        query_template: &str,
        collection_path: &str,
        extra_variables: &JsonObject,
        options: &PaginationOptions,
    ) -> Result<PageCollection> {
        options.validate()?;

        let verbose = options.request.verbose;
        let mut state = PaginationState::new();

        while state.pages < options.max_pages {
            let request = GraphqlRequest {
                endpoint: endpoint.to_string(),
                query: query_template.to_string(),
                variables: state.variables(extra_variables, options),
            };

            let response = self.engine.execute(&request, &options.request).await?;

            let errors = response.errors();
            if !errors.is_empty() {
                return Err(Error::Application { errors });
            }

            let data = response
                .data()
                .ok_or_else(|| Error::shape(collection_path, "response has no data object"))?;
            let connection = extract_connection(data, collection_path)?;
            let fetched = connection.items.len();

            let next = state.record_page(connection, collection_path)?;

            if verbose {
                info!(
                    "Page {} of '{}': {} items ({} total)",
                    state.pages,
                    collection_path,
                    fetched,
                    state.items.len()
                );
            } else {
                debug!(
                    "Page {} of '{}': {} items",
                    state.pages, collection_path, fetched
                );
            }

            if let NextPage::Done = next {
                return Ok(state.finish(false));
            }
        }

        warn!(
            "Stopped '{}' after {} pages (max_pages); {} items fetched, result may be incomplete",
            collection_path,
            state.pages,
            state.items.len()
        );
        Ok(state.finish(true))
    }

    /// Fetch every page of a described collection
    pub async fn fetch(&self, query: &CollectionQuery) -> Result<PageCollection> {
        self.fetch_all_pages(
            &query.endpoint,
            &query.query,
            &query.collection_path,
            &query.variables,
            &query.options,
        )
        .await
    }

    /// Walk independent collections with at most `concurrency` in flight.
    ///
    /// Results are returned in the order of `queries`. The first failure
    /// fails the batch.
    pub async fn fetch_collections(
        &self,
        queries: &[CollectionQuery],
        concurrency: usize,
    ) -> Result<Vec<PageCollection>> {
        stream::iter(queries.iter().map(|query| self.fetch(query)))
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }
}
