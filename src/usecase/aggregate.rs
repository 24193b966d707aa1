use std::collections::BTreeMap;

/// Whether a metric was computed over the loaded page or the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricScope {
    PageLocal,
    WholeCollection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateMetric {
    pub name: &'static str,
    pub value: f64,
    pub scope: MetricScope,
}

impl AggregateMetric {
    pub fn new(name: &'static str, value: f64, scope: MetricScope) -> Self {
        Self { name, value, scope }
    }
}

/// Percentage (0..=100) of items matching `predicate`; 0 for no items.
pub fn rate<T>(predicate: impl Fn(&T) -> bool, items: &[T]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let hits = items.iter().filter(|item| predicate(item)).count();
    hits as f64 * 100.0 / items.len() as f64
}

/// Mean of the values `selector` yields; items yielding `None` are skipped.
pub fn average<T>(selector: impl Fn(&T) -> Option<f64>, items: &[T]) -> f64 {
    let (sum, count) = items
        .iter()
        .filter_map(|item| selector(item))
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    Sum,
    Average,
}

pub struct GroupMetric<'a, T> {
    pub name: &'static str,
    pub reduce: Reduce,
    pub selector: &'a dyn Fn(&T) -> f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRanking {
    pub key: String,
    pub count: usize,
    /// One value per requested metric, in request order.
    pub values: Vec<(&'static str, f64)>,
}

impl GroupRanking {
    pub fn value(&self, name: &str) -> f64 {
        self.values
            .iter()
            .find(|(metric, _)| *metric == name)
            .map(|(_, value)| *value)
            .unwrap_or(0.0)
    }
}

/// Groups `items` by key, reduces each metric per group and keeps the `n`
/// best groups by `rank_by` (descending). Ties break on ascending key, so the
/// output is identical across runs. An unknown `rank_by` ranks by group size.
pub fn top_n<T>(
    key: impl Fn(&T) -> String,
    metrics: &[GroupMetric<'_, T>],
    rank_by: &str,
    items: &[T],
    n: usize,
) -> Vec<GroupRanking> {
    let mut groups: BTreeMap<String, Vec<&T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(item);
    }

    let mut ranked: Vec<GroupRanking> = groups
        .into_iter()
        .map(|(key, members)| {
            let values = metrics
                .iter()
                .map(|metric| {
                    let sum: f64 = members.iter().map(|item| (metric.selector)(item)).sum();
                    let value = match metric.reduce {
                        Reduce::Sum => sum,
                        Reduce::Average => sum / members.len() as f64,
                    };
                    (metric.name, value)
                })
                .collect();
            GroupRanking {
                key,
                count: members.len(),
                values,
            }
        })
        .collect();

    let ranks_by_metric = metrics.iter().any(|metric| metric.name == rank_by);
    ranked.sort_by(|a, b| {
        let (left, right) = if ranks_by_metric {
            (a.value(rank_by), b.value(rank_by))
        } else {
            (a.count as f64, b.count as f64)
        };
        right.total_cmp(&left).then_with(|| a.key.cmp(&b.key))
    });
    ranked.truncate(n);
    ranked
}

/// Item count per key, in key order.
pub fn count_by<T, K: Ord>(key: impl Fn(&T) -> K, items: &[T]) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}
