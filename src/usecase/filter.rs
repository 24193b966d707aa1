use crate::domain::entities::query::FilterExpression;

/// Free-text search over `fields`: an OR of case-insensitive `Contains`
/// clauses, or the identity filter for a blank term.
pub fn build_filter<F: Copy>(search_term: &str, fields: &[F]) -> FilterExpression<F> {
    let needle = search_term.trim();
    if needle.is_empty() || fields.is_empty() {
        return FilterExpression::All;
    }

    FilterExpression::Or(
        fields
            .iter()
            .map(|field| FilterExpression::Contains {
                field: *field,
                needle: needle.to_string(),
            })
            .collect(),
    )
}

/// ANDs exact-match facets onto `filter`. Blank facet values are ignored.
pub fn with_facets<F: Copy>(filter: FilterExpression<F>, facets: &[(F, String)]) -> FilterExpression<F> {
    let mut clauses: Vec<FilterExpression<F>> = facets
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(field, value)| FilterExpression::Equals {
            field: *field,
            value: value.trim().to_string(),
        })
        .collect();

    if clauses.is_empty() {
        return filter;
    }
    if !filter.is_identity() {
        clauses.insert(0, filter);
    }
    if clauses.len() == 1 {
        return clauses.remove(0);
    }
    FilterExpression::And(clauses)
}

/// Draft text of a search box plus an edit generation used for debouncing.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
    draft: String,
    committed: String,
    generation: u64,
}

impl SearchInput {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Records a keystroke and returns the ticket to commit after the delay.
    pub fn edit(&mut self, text: impl Into<String>) -> u64 {
        self.draft = text.into();
        self.generation += 1;
        self.generation
    }

    /// Returns the term to search for when `ticket` is still the newest edit
    /// and the draft differs from what was last committed.
    pub fn commit(&mut self, ticket: u64) -> Option<String> {
        if ticket != self.generation || self.draft == self.committed {
            return None;
        }
        self.committed = self.draft.clone();
        Some(self.committed.clone())
    }
}
