//! Exhaustive scanning, the baseline every pruning index is measured against.

use crate::distance::{Distance, DistanceValue, Proximity};
use crate::query::{
    CandidateHeap, KnnQuery, KnnResult, MetricIndex, QueryStats, RangeQuery, RangeResult,
};

use std::iter::FromIterator;

/// A [MetricIndex] that computes every distance.
///
/// No pruning, no build cost, no metric-axiom requirement.  Its results are exact by
/// construction, which makes it the correctness oracle for the pruning indexes, and its
/// [QueryStats] show the distance-call count everything else is trying to beat.
#[derive(Debug)]
pub struct ExhaustiveScan<T>(Vec<T>);

impl<T> ExhaustiveScan<T> {
    /// Create an empty ExhaustiveScan index.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a new item to the index.
    pub fn push(&mut self, item: T) {
        self.0.push(item);
    }

    /// Get the size of this index.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if this index is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for ExhaustiveScan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ExhaustiveScan<T> {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self(items.into_iter().collect())
    }
}

impl<T> IntoIterator for ExhaustiveScan<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> Extend<T> for ExhaustiveScan<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<K: Proximity<V>, V> MetricIndex<K, V> for ExhaustiveScan<V> {
    fn range_query(&self, query: &RangeQuery<K, DistanceValue<K, V>>) -> RangeResult<'_, V> {
        let mut stats = QueryStats::default();
        let mut items = Vec::new();

        for item in &self.0 {
            let d = query.object().distance(item).value();
            stats.distance_calls += 1;
            stats.verified += 1;
            if d <= query.radius() {
                items.push(item);
            }
        }

        RangeResult { items, stats }
    }

    fn knn_query(&self, query: &KnnQuery<K>) -> KnnResult<'_, V, DistanceValue<K, V>> {
        let mut stats = QueryStats::default();
        let mut heap = CandidateHeap::new(query.k().min(self.0.len()));

        for item in &self.0 {
            let d = query.object().distance(item).value();
            stats.distance_calls += 1;
            stats.verified += 1;
            heap.push(item, d);
        }

        KnnResult {
            neighbors: heap.into_sorted(),
            stats,
        }
    }
}
