//! Pivot tables.
//!
//! A pivot table ([LAESA](https://en.wikipedia.org/wiki/FastMap)-style) keeps
//! a dense matrix of distances from every indexed item to a small set of
//! pivots.  Queries measure their own distance to each pivot once, then walk
//! the matrix: the triangle inequality excludes an item when
//! `|d(p,q) - d(p,s)| > r` and admits one outright when `d(p,q) + d(p,s) <= r`,
//! so only the undecided remainder pays a real distance call.

use crate::distance::{Distance, DistanceValue, Metric, Proximity};
use crate::error::Result;
use crate::pivot::{rng_from_seed, select_pivots_with, PivotStrategy};
use crate::query::{
    CandidateHeap, KnnQuery, KnnResult, MetricIndex, QueryStats, RangeQuery, RangeResult,
};

use log::debug;

use std::fmt::{self, Debug, Formatter};

/// A flat triangle-inequality index over an owned dataset.
///
/// Pivots are dataset members; their rows stay in the table like anyone
/// else's.  The matrix is row-major, one row per item, one column per pivot.
pub struct PivotTable<T: Proximity> {
    items: Vec<T>,
    pivot_indices: Vec<usize>,
    matrix: Vec<DistanceValue<T>>,
    build_distance_calls: usize,
}

impl<T: Proximity> PivotTable<T> {
    /// Build a table owning `items`, with `pivot_count` pivots chosen by
    /// `strategy` (clamped to the dataset size).
    ///
    /// # Errors
    ///
    /// [`Error::EmptyDataset`][crate::Error::EmptyDataset] if `items` is empty,
    /// [`Error::ZeroPivots`][crate::Error::ZeroPivots] if `pivot_count` is zero.
    pub fn build(
        items: Vec<T>,
        pivot_count: usize,
        strategy: PivotStrategy,
        seed: Option<u64>,
    ) -> Result<Self> {
        let mut rng = rng_from_seed(seed);
        let mut distance_calls = 0;
        let pivot_indices =
            select_pivots_with(&items, pivot_count, strategy, &mut rng, &mut distance_calls)?;

        let mut matrix = Vec::with_capacity(items.len() * pivot_indices.len());
        for item in &items {
            for &p in &pivot_indices {
                matrix.push(item.distance(&items[p]).value());
            }
        }
        distance_calls += matrix.len();

        debug!(
            "pivot table built over {} items with {} pivots, {} distance calls",
            items.len(),
            pivot_indices.len(),
            distance_calls
        );

        Ok(Self {
            items,
            pivot_indices,
            matrix,
            build_distance_calls: distance_calls,
        })
    }

    /// The number of indexed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the table is empty.  Always false: empty builds are rejected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The indexed items, in their original order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The number of pivots actually used.
    pub fn pivot_count(&self) -> usize {
        self.pivot_indices.len()
    }

    /// The pivots, in selection order.
    pub fn pivots(&self) -> impl Iterator<Item = &T> + '_ {
        self.pivot_indices.iter().map(|&p| &self.items[p])
    }

    /// Distance calls spent building, pivot selection included.
    pub fn build_distance_calls(&self) -> usize {
        self.build_distance_calls
    }

    /// The stored distance from item `i` to pivot `j`.
    fn stored(&self, i: usize, j: usize) -> DistanceValue<T> {
        self.matrix[i * self.pivot_indices.len() + j]
    }
}

// Can't derive(Debug) due to https://github.com/rust-lang/rust/issues/26925
impl<T> Debug for PivotTable<T>
where
    T: Proximity + Debug,
    DistanceValue<T>: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("PivotTable")
            .field("items", &self.items)
            .field("pivot_indices", &self.pivot_indices)
            .field("matrix", &self.matrix)
            .field("build_distance_calls", &self.build_distance_calls)
            .finish()
    }
}

impl<K, V> MetricIndex<K, V> for PivotTable<V>
where
    K: Metric<V, Distance = V::Distance>,
    V: Metric,
{
    fn range_query(&self, query: &RangeQuery<K, DistanceValue<K, V>>) -> RangeResult<'_, V> {
        let mut stats = QueryStats::default();
        let radius = query.radius();

        let dpq: Vec<DistanceValue<V>> = self
            .pivot_indices
            .iter()
            .map(|&p| query.object().distance(&self.items[p]).value())
            .collect();
        stats.distance_calls += dpq.len();

        let mut items = Vec::new();
        'rows: for (i, item) in self.items.iter().enumerate() {
            for (j, &dpq_j) in dpq.iter().enumerate() {
                let dps = self.stored(i, j);

                // Exclude: |d(p,q) - d(p,s)| > r puts s out of reach.
                if dpq_j > dps + radius || dps > dpq_j + radius {
                    stats.excluded += 1;
                    continue 'rows;
                }

                // Include: d(p,q) + d(p,s) <= r caps the true distance at r.
                if dpq_j + dps <= radius {
                    stats.direct_included += 1;
                    items.push(item);
                    continue 'rows;
                }
            }

            // No pivot decided; pay the true distance.
            let d = query.object().distance(item).value();
            stats.distance_calls += 1;
            stats.verified += 1;
            if d <= radius {
                items.push(item);
            }
        }

        RangeResult { items, stats }
    }

    fn knn_query(&self, query: &KnnQuery<K>) -> KnnResult<'_, V, DistanceValue<K, V>> {
        let mut stats = QueryStats::default();

        let dpq: Vec<DistanceValue<V>> = self
            .pivot_indices
            .iter()
            .map(|&p| query.object().distance(&self.items[p]).value())
            .collect();
        stats.distance_calls += dpq.len();

        let mut heap = CandidateHeap::new(query.k().min(self.items.len()));

        'rows: for (i, item) in self.items.iter().enumerate() {
            // Exclusion needs a radius, which exists once the heap is full.
            if let Some(radius) = heap.admission_radius() {
                for (j, &dpq_j) in dpq.iter().enumerate() {
                    let dps = self.stored(i, j);
                    if dpq_j > dps + radius || dps > dpq_j + radius {
                        stats.excluded += 1;
                        continue 'rows;
                    }
                }
            }

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

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;
    use crate::euclid::Euclidean;
    use crate::tests::{check_exact_index, Point};

    #[test]
    fn test_pivot_table() {
        check_exact_index(|points| {
            PivotTable::build(points, 3, PivotStrategy::FarthestFirst, Some(42)).unwrap()
        });
    }

    #[test]
    fn test_single_pivot() {
        check_exact_index(|points| {
            PivotTable::build(points, 1, PivotStrategy::Random, Some(7)).unwrap()
        });
    }

    #[test]
    fn test_all_strategies() {
        for strategy in [
            PivotStrategy::Random,
            PivotStrategy::FarthestFirst,
            PivotStrategy::MaxSpread,
            PivotStrategy::Incremental,
        ] {
            check_exact_index(|points| PivotTable::build(points, 2, strategy, Some(3)).unwrap());
        }
    }

    #[test]
    fn test_rejects_empty() {
        let result = PivotTable::build(
            Vec::<Point>::new(),
            2,
            PivotStrategy::Random,
            Some(1),
        );
        assert_eq!(result.err(), Some(Error::EmptyDataset));
    }

    #[test]
    fn test_rejects_zero_pivots() {
        let points = vec![Euclidean([0.0, 0.0])];
        let result = PivotTable::build(points, 0, PivotStrategy::Random, Some(1));
        assert_eq!(result.err(), Some(Error::ZeroPivots));
    }

    #[test]
    fn test_pivot_count_clamps() {
        let points = vec![
            Euclidean([0.0, 0.0]),
            Euclidean([1.0, 0.0]),
            Euclidean([2.0, 0.0]),
        ];
        let table = PivotTable::build(points, 64, PivotStrategy::Random, Some(1)).unwrap();
        assert_eq!(table.pivot_count(), 3);
        assert_eq!(table.pivots().count(), 3);
    }

    #[test]
    fn test_build_distance_calls() {
        // Random selection computes no distances, so the build cost is
        // exactly the matrix fill.
        let points = vec![
            Euclidean([0.0, 0.0]),
            Euclidean([1.0, 0.0]),
            Euclidean([2.0, 0.0]),
            Euclidean([3.0, 0.0]),
            Euclidean([4.0, 0.0]),
        ];
        let table = PivotTable::build(points, 2, PivotStrategy::Random, Some(1)).unwrap();
        assert_eq!(table.build_distance_calls(), 5 * 2);
    }

    #[test]
    fn test_range_classifies_every_row() {
        // A tight pair plus a far outlier: whichever pivot is chosen, the
        // outlier is excluded and the pair needs verification.
        let points = vec![
            Euclidean([0.0, 0.0]),
            Euclidean([1.0, 0.0]),
            Euclidean([1000.0, 0.0]),
        ];
        let table = PivotTable::build(points, 1, PivotStrategy::Random, Some(9)).unwrap();

        let query = RangeQuery::new(Euclidean([0.5, 0.0]), 1.0).unwrap();
        let result = table.range_query(&query);

        assert_eq!(result.items.len(), 2);
        assert!(result.stats.excluded >= 1);
        assert_eq!(
            result.stats.excluded + result.stats.direct_included + result.stats.verified,
            table.len()
        );
    }

    #[test]
    fn test_direct_include_skips_verification() {
        // A huge radius makes every include test succeed at the first pivot,
        // so the only distance calls are the query-to-pivot ones.
        let points = vec![
            Euclidean([0.0, 0.0]),
            Euclidean([1.0, 0.0]),
            Euclidean([2.0, 0.0]),
        ];
        let table = PivotTable::build(points, 2, PivotStrategy::Random, Some(5)).unwrap();

        let query = RangeQuery::new(Euclidean([0.0, 0.0]), 10_000.0).unwrap();
        let result = table.range_query(&query);

        assert_eq!(result.items.len(), 3);
        assert_eq!(result.stats.direct_included, 3);
        assert_eq!(result.stats.excluded, 0);
        assert_eq!(result.stats.verified, 0);
        assert_eq!(result.stats.distance_calls, table.pivot_count());
    }

    #[test]
    fn test_knn_excludes_with_shrunk_radius() {
        // After the close pair fills the heap, the admission radius is small
        // enough for any pivot to exclude the outlier.
        let points = vec![
            Euclidean([0.0, 0.0]),
            Euclidean([1.0, 0.0]),
            Euclidean([1000.0, 0.0]),
        ];
        let table = PivotTable::build(points, 1, PivotStrategy::Random, Some(9)).unwrap();

        let query = KnnQuery::new(Euclidean([0.5, 0.0]), 2).unwrap();
        let result = table.knn_query(&query);

        assert_eq!(result.neighbors.len(), 2);
        assert_eq!(result.stats.excluded, 1);
        assert_eq!(result.stats.verified, 2);
        assert_eq!(result.stats.distance_calls, table.pivot_count() + 2);
    }
}
