//! Generalized hyperplane trees.
//!
//! A GH tree partitions a metric space with hyperplanes: each branch holds
//! two pivots and sends every item to the side of the pivot it is closer to,
//! ties going right.  A query at distance `d1` and `d2` from the pivots can
//! skip a side only when `d1 - d2 > 2r`; by the triangle inequality no item
//! within `r` of the query can then sit on that side.

use crate::distance::{Distance, DistanceValue, Metric, Proximity, Value};
use crate::error::Result;
use crate::query::{
    CandidateHeap, KnnQuery, KnnResult, MetricIndex, QueryStats, RangeQuery, RangeResult,
};
use crate::tree::{self, build_tree, BuildContext, Node, Partition, Split, TreeConfig, TreeStats};

use log::debug;

use std::fmt::{self, Debug, Formatter};

/// The branch record of a hyperplane partition.
///
/// The pivots here are copies: the originals are partitioned into the
/// children like any other item, so results always surface from leaves.
#[derive(Clone, Debug)]
struct HyperplaneSplit<T> {
    left_pivot: T,
    right_pivot: T,
}

impl<T: Proximity + Clone> Split<T> for HyperplaneSplit<T> {
    fn split(items: Vec<T>, ctx: &mut BuildContext<'_>) -> Result<Partition<T, Self>> {
        let pivot_at = ctx.select_pivots(&items, 2)?;
        let left_pivot = items[pivot_at[0]].clone();
        let right_pivot = items[pivot_at[1]].clone();

        let mut left = Vec::new();
        let mut right = Vec::new();
        for item in items {
            let d1 = item.distance(&left_pivot).value();
            let d2 = item.distance(&right_pivot).value();
            ctx.distance_calls += 2;

            if d1 < d2 {
                left.push(item);
            } else {
                right.push(item);
            }
        }

        // All items on one side happens with duplicates or ties; the node
        // becomes a leaf rather than recursing forever.
        if left.is_empty() {
            return Ok(Partition::Degenerate(right));
        }
        if right.is_empty() {
            return Ok(Partition::Degenerate(left));
        }

        Ok(Partition::Split(
            Self {
                left_pivot,
                right_pivot,
            },
            left,
            right,
        ))
    }

    fn resident(&self) -> Option<&T> {
        None
    }

    fn into_resident(self) -> Option<T> {
        None
    }
}

/// Whether the side whose pivot is at `d_side` from the query might hold a
/// neighbor, given the other pivot at `d_other`.  `None` means the search
/// radius is still unbounded.
fn side_admissible<R: Value>(d_side: R, d_other: R, radius: Option<R>) -> bool {
    match radius {
        Some(radius) => d_side <= d_other + radius + radius,
        None => true,
    }
}

/// A generalized hyperplane tree.
///
/// Built once over an owned dataset, immutable afterwards.  Items require
/// [Clone] because each branch keeps copies of its two pivots for pruning.
pub struct GhTree<T: Proximity> {
    root: Node<T, HyperplaneSplit<T>>,
    len: usize,
    stats: TreeStats,
}

impl<T: Proximity + Clone> GhTree<T> {
    /// Build a tree owning `items`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyDataset`][crate::Error::EmptyDataset] if `items` is empty.
    pub fn build(items: Vec<T>, config: &TreeConfig) -> Result<Self> {
        let len = items.len();
        let (root, stats) = build_tree(items, config)?;

        if config.verbose() {
            debug!(
                "gh-tree built over {} items: {} nodes ({} leaves), height {}, {} distance calls",
                len, stats.node_count, stats.leaf_count, stats.height, stats.build_distance_calls
            );
        }

        Ok(Self { root, len, stats })
    }
}

impl<T: Proximity> GhTree<T> {
    /// The number of indexed items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree is empty.  Always false: empty builds are rejected.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Shape and build-cost measurements.
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// Iterate over the items stored in this tree.
    pub fn iter(&self) -> Iter<'_, T>
    where
        T: Clone,
    {
        self.into_iter()
    }
}

impl<T: Proximity + Debug> Debug for GhTree<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GhTree")
            .field("root", &self.root)
            .field("len", &self.len)
            .field("stats", &self.stats)
            .finish()
    }
}

/// An iterator over the values in a GH tree.
pub struct Iter<'a, T: Proximity>(tree::Iter<'a, T, HyperplaneSplit<T>>);

impl<'a, T: Proximity + Clone> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.0.next()
    }
}

impl<'a, T: Proximity + Clone> IntoIterator for &'a GhTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter(tree::Iter::new(&self.root))
    }
}

/// An iterator that moves values out of a GH tree.
pub struct IntoIter<T: Proximity>(tree::IntoIter<T, HyperplaneSplit<T>>);

impl<T: Proximity + Clone> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.next()
    }
}

impl<T: Proximity + Clone> IntoIterator for GhTree<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(tree::IntoIter::new(self.root))
    }
}

/// Recursive range search.
fn range_walk<'v, K, V>(
    node: &'v Node<V, HyperplaneSplit<V>>,
    query: &K,
    radius: DistanceValue<V>,
    items: &mut Vec<&'v V>,
    stats: &mut QueryStats,
) where
    K: Proximity<V, Distance = V::Distance>,
    V: Proximity,
{
    stats.nodes_visited += 1;

    match node {
        Node::Leaf { items: held, .. } => {
            for item in held {
                let d = query.distance(item).value();
                stats.distance_calls += 1;
                stats.verified += 1;
                if d <= radius {
                    items.push(item);
                }
            }
        }
        Node::Branch { split, left, right } => {
            // Routing distances only; the pivots themselves are candidates
            // down in the leaves.
            let d1 = query.distance(&split.left_pivot).value();
            let d2 = query.distance(&split.right_pivot).value();
            stats.distance_calls += 2;

            let doubled = radius + radius;
            if d1 <= d2 + doubled {
                range_walk(left, query, radius, items, stats);
            }
            if d2 <= d1 + doubled {
                range_walk(right, query, radius, items, stats);
            }
        }
    }
}

/// Recursive k-nearest-neighbor search.
fn knn_walk<'v, K, V>(
    node: &'v Node<V, HyperplaneSplit<V>>,
    query: &K,
    heap: &mut CandidateHeap<&'v V, DistanceValue<V>>,
    stats: &mut QueryStats,
) where
    K: Proximity<V, Distance = V::Distance>,
    V: Proximity,
{
    stats.nodes_visited += 1;

    match node {
        Node::Leaf { items, .. } => {
            for item in items {
                let d = query.distance(item).value();
                stats.distance_calls += 1;
                stats.verified += 1;
                heap.push(item, d);
            }
        }
        Node::Branch { split, left, right } => {
            let d1 = query.distance(&split.left_pivot).value();
            let d2 = query.distance(&split.right_pivot).value();
            stats.distance_calls += 2;

            // Closer side first so the admission radius shrinks before the
            // other side is tested; the radius is re-read in between.
            if d1 <= d2 {
                if side_admissible(d1, d2, heap.admission_radius()) {
                    knn_walk(left, query, heap, stats);
                }
                if side_admissible(d2, d1, heap.admission_radius()) {
                    knn_walk(right, query, heap, stats);
                }
            } else {
                if side_admissible(d2, d1, heap.admission_radius()) {
                    knn_walk(right, query, heap, stats);
                }
                if side_admissible(d1, d2, heap.admission_radius()) {
                    knn_walk(left, query, heap, stats);
                }
            }
        }
    }
}

impl<K, V> MetricIndex<K, V> for GhTree<V>
where
    K: Metric<V, Distance = V::Distance>,
    V: Metric,
{
    fn range_query(&self, query: &RangeQuery<K, DistanceValue<K, V>>) -> RangeResult<'_, V> {
        let mut stats = QueryStats::default();
        let mut items = Vec::new();

        range_walk(
            &self.root,
            query.object(),
            query.radius(),
            &mut items,
            &mut stats,
        );

        RangeResult { items, stats }
    }

    fn knn_query(&self, query: &KnnQuery<K>) -> KnnResult<'_, V, DistanceValue<K, V>> {
        let mut stats = QueryStats::default();
        let mut heap = CandidateHeap::new(query.k().min(self.len));

        knn_walk(&self.root, query.object(), &mut heap, &mut stats);

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
    use crate::pivot::PivotStrategy;
    use crate::tests::{check_exact_index, random_points, Point};

    #[test]
    fn test_gh_tree() {
        let config = TreeConfig::builder().seed(42).build().unwrap();
        check_exact_index(|points| GhTree::build(points, &config).unwrap());
    }

    #[test]
    fn test_gh_tree_small_leaves() {
        let config = TreeConfig::builder()
            .max_leaf_size(2)
            .min_height(2)
            .seed(17)
            .build()
            .unwrap();
        check_exact_index(|points| GhTree::build(points, &config).unwrap());
    }

    #[test]
    fn test_gh_tree_all_strategies() {
        for strategy in [
            PivotStrategy::Random,
            PivotStrategy::FarthestFirst,
            PivotStrategy::MaxSpread,
            PivotStrategy::Incremental,
        ] {
            let config = TreeConfig::builder()
                .strategy(strategy)
                .seed(7)
                .build()
                .unwrap();
            check_exact_index(|points| GhTree::build(points, &config).unwrap());
        }
    }

    #[test]
    fn test_rejects_empty() {
        let config = TreeConfig::default();
        let result = GhTree::build(Vec::<Point>::new(), &config);
        assert_eq!(result.err(), Some(Error::EmptyDataset));
    }

    #[test]
    fn test_reachability() {
        let config = TreeConfig::builder()
            .max_leaf_size(3)
            .min_height(2)
            .seed(42)
            .build()
            .unwrap();

        let points = random_points(200, 0xBEEF);
        let tree = GhTree::build(points.clone(), &config).unwrap();

        assert_eq!(tree.len(), points.len());
        assert!(tree.stats().height >= 2);
        assert_eq!(
            tree.stats().node_count,
            tree.stats().leaf_count + tree.stats().branch_count
        );

        // Pivot copies in the branches must not duplicate any item.
        let mut seen: Vec<_> = tree.iter().map(|p| (p.0[0], p.0[1])).collect();
        let mut expected: Vec<_> = points.iter().map(|p| (p.0[0], p.0[1])).collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_duplicate_points_collapse_to_a_leaf() {
        let config = TreeConfig::builder().seed(5).build().unwrap();

        // Identical points all tie, so every partition is one-sided and the
        // degenerate fallback makes the root a leaf.
        let points = vec![Euclidean([1.0, 2.0]); 10];
        let tree = GhTree::build(points, &config).unwrap();

        assert_eq!(tree.stats().height, 0);
        assert_eq!(tree.stats().node_count, 1);
        assert_eq!(tree.stats().leaf_count, 1);

        let query = RangeQuery::new(Euclidean([1.0, 2.0]), 0.0).unwrap();
        let result = tree.range_query(&query);
        assert_eq!(result.items.len(), 10);
    }

    #[test]
    fn test_build_is_deterministic_with_seed() {
        let config = TreeConfig::builder().seed(99).build().unwrap();
        let points = random_points(150, 0xF00D);

        let a = GhTree::build(points.clone(), &config).unwrap();
        let b = GhTree::build(points, &config).unwrap();
        assert_eq!(a.stats(), b.stats());
    }
}
