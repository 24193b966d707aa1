use std::fmt::Debug;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A searchable/sortable column of one entity type.
pub trait FieldName: Debug + Clone + Copy + PartialEq + Eq + 'static {
    fn name(&self) -> &'static str;

    /// Fields matched by the free-text search box, in display order.
    fn searchable() -> &'static [Self];

    /// Ordering used before the user picks one.
    fn default_sort() -> SortSpec<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpression<F> {
    All,
    Contains { field: F, needle: String },
    Equals { field: F, value: String },
    Or(Vec<FilterExpression<F>>),
    And(Vec<FilterExpression<F>>),
}

impl<F> FilterExpression<F> {
    pub fn is_identity(&self) -> bool {
        matches!(self, FilterExpression::All)
    }

    pub fn clause_count(&self) -> usize {
        match self {
            FilterExpression::All => 0,
            FilterExpression::Contains { .. } | FilterExpression::Equals { .. } => 1,
            FilterExpression::Or(clauses) | FilterExpression::And(clauses) => clauses.len(),
        }
    }
}

impl<F> Default for FilterExpression<F> {
    fn default() -> Self {
        FilterExpression::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> SortKey<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

/// Ordered sort keys. Never empty once it has passed through `usecase::sort`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec<F> {
    pub keys: Vec<SortKey<F>>,
}

impl<F: Copy> SortSpec<F> {
    pub fn new(keys: Vec<SortKey<F>>) -> Self {
        Self { keys }
    }

    pub fn single(key: SortKey<F>) -> Self {
        Self { keys: vec![key] }
    }

    pub fn primary(&self) -> Option<SortKey<F>> {
        self.keys.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Issued,
    Resolved,
    Rejected,
}

/// Pure transition function of the query lifecycle.
pub fn next_status(current: QueryStatus, event: StatusEvent) -> QueryStatus {
    match (current, event) {
        (_, StatusEvent::Issued) => QueryStatus::Loading,
        (QueryStatus::Loading, StatusEvent::Resolved) => QueryStatus::Success,
        (QueryStatus::Loading, StatusEvent::Rejected) => QueryStatus::Error,
        (state, _) => state,
    }
}
