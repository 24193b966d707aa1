use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::entities::query::{FilterExpression, SortSpec};
use crate::infra::sqlite::queries::query_page;
use crate::infra::sqlite::records::SqlRecord;
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::ports::source::{FetchedPage, PageSource, SourceError};

/// Serves one entity table as a paginated collection.
pub struct SqliteSource<E> {
    pub db_path: PathBuf,
    _record: PhantomData<fn() -> E>,
}

impl<E> SqliteSource<E> {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            _record: PhantomData,
        }
    }
}

#[async_trait(?Send)]
impl<E: SqlRecord> PageSource<E, E::Field> for SqliteSource<E> {
    async fn fetch_page(
        &self,
        filter: &FilterExpression<E::Field>,
        sort: &SortSpec<E::Field>,
        offset: u64,
        limit: u64,
    ) -> Result<FetchedPage<E>, SourceError> {
        let db_path = self.db_path.clone();
        let filter = filter.clone();
        let sort = sort.clone();

        let (items, count) = run_blocking(move || query_page::<E>(&db_path, &filter, &sort, offset, limit))
            .await
            .map_err(|err| SourceError::Unavailable(err.to_string()))?
            .map_err(|err| SourceError::Query(format!("{err:#}")))?;

        debug!(table = E::TABLE, offset, limit, count, "fetched page");
        Ok(FetchedPage { items, count })
    }
}
