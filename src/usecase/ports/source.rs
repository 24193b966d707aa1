use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::query::{FilterExpression, SortSpec};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

/// One page of a collection plus the size of the whole filtered collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage<T> {
    pub items: Vec<T>,
    pub count: u64,
}

/// Stateless request/response boundary to a paginated backend collection.
#[async_trait(?Send)]
pub trait PageSource<T, F> {
    async fn fetch_page(
        &self,
        filter: &FilterExpression<F>,
        sort: &SortSpec<F>,
        offset: u64,
        limit: u64,
    ) -> Result<FetchedPage<T>, SourceError>;
}
