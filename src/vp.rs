//! [Vantage-point trees](https://en.wikipedia.org/wiki/Vantage-point_tree).
//!
//! A vantage-point tree partitions a metric space with balls: each branch
//! holds one pivot, sends the closer half of its items into an inner shell
//! and the rest into an outer shell, and records the exact distance bounds of
//! both shells.  Queries compare their distance to the pivot against those
//! bounds and skip every shell the query ball cannot reach.

use crate::distance::{Distance, DistanceValue, Metric, Ordered, Proximity, Value};
use crate::error::Result;
use crate::query::{
    CandidateHeap, KnnQuery, KnnResult, MetricIndex, QueryStats, RangeQuery, RangeResult,
};
use crate::tree::{self, build_tree, BuildContext, Node, Partition, Split, TreeConfig, TreeStats};

use log::debug;
use num_traits::one;

use std::fmt::{self, Debug, Formatter};

/// The closed interval of pivot distances observed in one shell.
#[derive(Clone, Copy, Debug)]
struct ShellBounds<R> {
    lower: R,
    upper: R,
}

impl<R: Value> ShellBounds<R> {
    /// Whether a ball of `radius` around a query at `distance` from the pivot
    /// can reach this shell.
    fn overlaps(&self, distance: R, radius: R) -> bool {
        !(distance + radius < self.lower || distance > self.upper + radius)
    }

    /// [overlaps][Self::overlaps] against an optional radius; `None` means unbounded.
    fn overlaps_within(&self, distance: R, radius: Option<R>) -> bool {
        match radius {
            Some(radius) => self.overlaps(distance, radius),
            None => true,
        }
    }
}

/// The branch record of a ball partition.
///
/// The pivot lives here, in the branch itself; it is not duplicated into either child.  The
/// left child holds the inner shell, the right child the outer shell.
#[derive(Clone, Debug)]
struct BallSplit<T, R = DistanceValue<T>> {
    /// The vantage point.
    pivot: T,
    /// The midpoint between the shells, steering k-NN visit order.
    boundary: R,
    /// Pivot-distance bounds of the inner shell.
    inner: ShellBounds<R>,
    /// Pivot-distance bounds of the outer shell.
    outer: ShellBounds<R>,
}

impl<T: Proximity> Split<T> for BallSplit<T> {
    fn split(mut items: Vec<T>, ctx: &mut BuildContext<'_>) -> Result<Partition<T, Self>> {
        let pivot_at = ctx.select_pivots(&items, 1)?[0];
        let pivot = items.swap_remove(pivot_at);

        let mut scored: Vec<(DistanceValue<T>, T)> = items
            .into_iter()
            .map(|item| (pivot.distance(&item).value(), item))
            .collect();
        ctx.distance_calls += scored.len();
        scored.sort_by_key(|entry| Ordered::new(entry.0));

        // At least two scored items remain, so both shells are non-empty.
        let mid = (scored.len() + 1) / 2;
        let inner = ShellBounds {
            lower: scored[0].0,
            upper: scored[mid - 1].0,
        };
        let outer = ShellBounds {
            lower: scored[mid].0,
            upper: scored[scored.len() - 1].0,
        };
        let boundary = (inner.upper + outer.lower) / (one::<DistanceValue<T>>() + one());

        let outer_items = scored.split_off(mid).into_iter().map(|(_, item)| item);
        let inner_items = scored.into_iter().map(|(_, item)| item);

        Ok(Partition::Split(
            Self {
                pivot,
                boundary,
                inner,
                outer,
            },
            inner_items.collect(),
            outer_items.collect(),
        ))
    }

    fn resident(&self) -> Option<&T> {
        Some(&self.pivot)
    }

    fn into_resident(self) -> Option<T> {
        Some(self.pivot)
    }
}

/// A [vantage-point tree](https://en.wikipedia.org/wiki/Vantage-point_tree).
///
/// Built once over an owned dataset, immutable afterwards.  Every indexed item sits in exactly
/// one place: branch pivots in their branches, everything else in a leaf.
pub struct VpTree<T: Proximity> {
    root: Node<T, BallSplit<T>>,
    len: usize,
    stats: TreeStats,
}

impl<T: Proximity> VpTree<T> {
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
                "vp-tree built over {} items: {} nodes ({} leaves), height {}, {} distance calls",
                len, stats.node_count, stats.leaf_count, stats.height, stats.build_distance_calls
            );
        }

        Ok(Self { root, len, stats })
    }

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
    pub fn iter(&self) -> Iter<'_, T> {
        self.into_iter()
    }
}

// Can't derive(Debug) due to https://github.com/rust-lang/rust/issues/26925
impl<T> Debug for VpTree<T>
where
    T: Proximity + Debug,
    DistanceValue<T>: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("VpTree")
            .field("root", &self.root)
            .field("len", &self.len)
            .field("stats", &self.stats)
            .finish()
    }
}

/// An iterator over the values in a VP tree.
pub struct Iter<'a, T: Proximity>(tree::Iter<'a, T, BallSplit<T>>);

impl<'a, T: Proximity> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.0.next()
    }
}

impl<'a, T: Proximity> IntoIterator for &'a VpTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter(tree::Iter::new(&self.root))
    }
}

/// An iterator that moves values out of a VP tree.
pub struct IntoIter<T: Proximity>(tree::IntoIter<T, BallSplit<T>>);

impl<T: Proximity> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.next()
    }
}

impl<T: Proximity> IntoIterator for VpTree<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(tree::IntoIter::new(self.root))
    }
}

/// Recursive range search.
fn range_walk<'v, K, V>(
    node: &'v Node<V, BallSplit<V>>,
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
            let dq = query.distance(&split.pivot).value();
            stats.distance_calls += 1;
            stats.verified += 1;

            // The pivot lives in this branch, not in a child.
            if dq <= radius {
                items.push(&split.pivot);
            }

            if split.inner.overlaps(dq, radius) {
                range_walk(left, query, radius, items, stats);
            }
            if split.outer.overlaps(dq, radius) {
                range_walk(right, query, radius, items, stats);
            }
        }
    }
}

/// Recursive k-nearest-neighbor search.
fn knn_walk<'v, K, V>(
    node: &'v Node<V, BallSplit<V>>,
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
            let dq = query.distance(&split.pivot).value();
            stats.distance_calls += 1;
            stats.verified += 1;
            heap.push(&split.pivot, dq);

            // Visit the more promising shell first so the admission radius
            // shrinks before the other shell is tested.  The radius is
            // re-read between the two visits for the same reason.
            if dq <= split.boundary {
                if split.inner.overlaps_within(dq, heap.admission_radius()) {
                    knn_walk(left, query, heap, stats);
                }
                if split.outer.overlaps_within(dq, heap.admission_radius()) {
                    knn_walk(right, query, heap, stats);
                }
            } else {
                if split.outer.overlaps_within(dq, heap.admission_radius()) {
                    knn_walk(right, query, heap, stats);
                }
                if split.inner.overlaps_within(dq, heap.admission_radius()) {
                    knn_walk(left, query, heap, stats);
                }
            }
        }
    }
}

impl<K, V> MetricIndex<K, V> for VpTree<V>
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
    use crate::pivot::PivotStrategy;
    use crate::tests::{check_exact_index, random_points, small_points, Point};

    /// Walk the tree checking the structural guarantees of every node.
    fn check_structure(tree: &VpTree<Point>, config: &TreeConfig) {
        fn walk(node: &Node<Point, BallSplit<Point>>, config: &TreeConfig) -> usize {
            match node {
                Node::Leaf { items, depth } => {
                    assert!(
                        items.len() <= 2
                            || (*depth >= config.min_height()
                                && items.len() <= config.max_leaf_size()),
                        "leaf of {} items at depth {}",
                        items.len(),
                        depth
                    );
                    items.len()
                }
                Node::Branch { split, left, right } => {
                    assert!(split.inner.lower <= split.inner.upper);
                    assert!(split.outer.lower <= split.outer.upper);
                    assert!(split.inner.upper <= split.outer.lower);
                    walk(left, config) + walk(right, config) + 1
                }
            }
        }

        assert_eq!(walk(&tree.root, config), tree.len());
    }

    #[test]
    fn test_vp_tree() {
        let config = TreeConfig::builder().seed(42).build().unwrap();
        check_exact_index(|points| VpTree::build(points, &config).unwrap());
    }

    #[test]
    fn test_vp_tree_small_leaves() {
        let config = TreeConfig::builder()
            .max_leaf_size(2)
            .min_height(2)
            .seed(17)
            .build()
            .unwrap();
        check_exact_index(|points| VpTree::build(points, &config).unwrap());
    }

    #[test]
    fn test_vp_tree_all_strategies() {
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
            check_exact_index(|points| VpTree::build(points, &config).unwrap());
        }
    }

    #[test]
    fn test_rejects_empty() {
        let config = TreeConfig::default();
        let result = VpTree::build(Vec::<Point>::new(), &config);
        assert_eq!(result.err(), Some(Error::EmptyDataset));
    }

    #[test]
    fn test_structure_and_reachability() {
        let config = TreeConfig::builder()
            .max_leaf_size(3)
            .min_height(2)
            .seed(42)
            .build()
            .unwrap();

        let points = random_points(200, 0xBEEF);
        let tree = VpTree::build(points.clone(), &config).unwrap();

        check_structure(&tree, &config);
        assert_eq!(tree.len(), points.len());
        assert!(tree.stats().height >= config.min_height());
        assert_eq!(
            tree.stats().node_count,
            tree.stats().leaf_count + tree.stats().branch_count
        );

        // Every built item is reachable exactly once.
        let mut seen: Vec<_> = tree.iter().map(|p| (p.0[0], p.0[1])).collect();
        let mut expected: Vec<_> = points.iter().map(|p| (p.0[0], p.0[1])).collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_into_iter_returns_dataset() {
        let config = TreeConfig::builder().seed(3).build().unwrap();
        let points = small_points();
        let tree = VpTree::build(points.clone(), &config).unwrap();

        let mut seen: Vec<_> = tree.into_iter().map(|p| (p.0[0], p.0[1])).collect();
        let mut expected: Vec<_> = points.iter().map(|p| (p.0[0], p.0[1])).collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_build_is_deterministic_with_seed() {
        let config = TreeConfig::builder().seed(99).build().unwrap();
        let points = random_points(150, 0xF00D);

        let a = VpTree::build(points.clone(), &config).unwrap();
        let b = VpTree::build(points, &config).unwrap();
        assert_eq!(a.stats(), b.stats());
    }
}
