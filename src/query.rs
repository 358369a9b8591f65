//! Query descriptors, results, and the common index interface.

use crate::distance::{DistanceValue, Ordered, Proximity, Value};
use crate::error::{Error, Result};

use num_traits::zero;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A range query: every item within `radius` of `object`.
#[derive(Clone, Debug)]
pub struct RangeQuery<Q, R> {
    object: Q,
    radius: R,
}

impl<Q, R: Value> RangeQuery<Q, R> {
    /// Create a range query, rejecting negative radii.
    pub fn new(object: Q, radius: R) -> Result<Self> {
        if radius < zero() {
            Err(Error::NegativeRadius)
        } else {
            Ok(Self { object, radius })
        }
    }

    /// The query object.
    pub fn object(&self) -> &Q {
        &self.object
    }

    /// The search radius.
    pub fn radius(&self) -> R {
        self.radius
    }
}

/// A k-nearest-neighbor query: the `k` items closest to `object`.
#[derive(Clone, Debug)]
pub struct KnnQuery<Q> {
    object: Q,
    k: usize,
}

impl<Q> KnnQuery<Q> {
    /// Create a k-nearest-neighbor query, rejecting `k == 0`.
    pub fn new(object: Q, k: usize) -> Result<Self> {
        if k == 0 {
            Err(Error::ZeroNeighbors)
        } else {
            Ok(Self { object, k })
        }
    }

    /// The query object.
    pub fn object(&self) -> &Q {
        &self.object
    }

    /// The number of neighbors to return.
    pub fn k(&self) -> usize {
        self.k
    }
}

/// A k-nearest-neighbor query re-ranked toward result diversity.
///
/// `diversity_weight` trades proximity (`0.0`) against spread between the returned items
/// (`1.0`).  None of the indexes in this crate execute diversified queries; the descriptor
/// exists so engines layered on top share this crate's validation.
#[derive(Clone, Debug)]
pub struct DiversifiedKnnQuery<Q> {
    object: Q,
    k: usize,
    diversity_weight: f64,
}

impl<Q> DiversifiedKnnQuery<Q> {
    /// Create a diversified query, rejecting `k == 0` and weights outside `[0, 1]`.
    pub fn new(object: Q, k: usize, diversity_weight: f64) -> Result<Self> {
        if k == 0 {
            Err(Error::ZeroNeighbors)
        } else if !(0.0..=1.0).contains(&diversity_weight) {
            Err(Error::InvalidDiversityWeight {
                got: diversity_weight,
            })
        } else {
            Ok(Self {
                object,
                k,
                diversity_weight,
            })
        }
    }

    /// The query object.
    pub fn object(&self) -> &Q {
        &self.object
    }

    /// The number of neighbors to return.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The proximity/diversity trade-off in `[0, 1]`.
    pub fn diversity_weight(&self) -> f64 {
        self.diversity_weight
    }
}

/// An item and its distance from a query object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor<V, R> {
    /// The item.
    pub item: V,
    /// The distance between the query object and this item.
    pub distance: R,
}

impl<V, R> Neighbor<V, R> {
    /// Create a new Neighbor.
    pub fn new(item: V, distance: R) -> Self {
        Self { item, distance }
    }
}

/// Work counters for a single query.
///
/// Distance calls are the universal cost measure: every index reports exactly how many times it
/// evaluated the underlying distance function, so pruning quality can be compared across index
/// types and metrics.  The remaining counters describe where the work went.  `nodes_visited`
/// stays zero for flat indexes, and `excluded`/`direct_included` stay zero for trees, whose
/// pruning skips whole subtrees instead of individual candidates.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryStats {
    /// How many times the distance function was evaluated.
    pub distance_calls: usize,
    /// How many tree nodes the query entered.
    pub nodes_visited: usize,
    /// Candidates ruled out by the triangle inequality, without a distance call.
    pub excluded: usize,
    /// Candidates accepted by the triangle inequality, without a distance call.
    pub direct_included: usize,
    /// Candidates whose true distance was computed and checked.
    pub verified: usize,
}

/// The outcome of a range query: matching items, in no particular order.
#[derive(Clone, Debug)]
pub struct RangeResult<'v, V> {
    /// Every item within the query radius.
    pub items: Vec<&'v V>,
    /// Work counters for this query.
    pub stats: QueryStats,
}

/// The outcome of a k-nearest-neighbor query: neighbors ascending by distance.
#[derive(Clone, Debug)]
pub struct KnnResult<'v, V, R> {
    /// The k nearest items, closest first.  Ties are broken arbitrarily but consistently.
    pub neighbors: Vec<Neighbor<&'v V, R>>,
    /// Work counters for this query.
    pub stats: QueryStats,
}

/// A similarity-search index over a metric space.
///
/// Implementations hold an immutable snapshot of their dataset and answer both query shapes
/// against it.  Queries take `&self` and return all per-call state by value, so a built index
/// can be queried repeatedly, with identical queries producing identical results and identical
/// [QueryStats].
///
/// Type parameters:
///
/// * `K`: The query key type.
/// * `V`: The item type.
pub trait MetricIndex<K: Proximity<V>, V = K> {
    /// Find every item within the query radius.
    fn range_query(&self, query: &RangeQuery<K, DistanceValue<K, V>>) -> RangeResult<'_, V>;

    /// Find the k items nearest to the query object, closest first.
    ///
    /// If `k` exceeds the number of indexed items, every item is returned.
    fn knn_query(&self, query: &KnnQuery<K>) -> KnnResult<'_, V, DistanceValue<K, V>>;
}

/// An entry in a [CandidateHeap], ordered by distance.
#[derive(Clone, Copy, Debug)]
struct HeapEntry<I, R> {
    item: I,
    distance: R,
}

impl<I, R: PartialOrd> PartialEq for HeapEntry<I, R> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I, R: PartialOrd> Eq for HeapEntry<I, R> {}

impl<I, R: PartialOrd> PartialOrd for HeapEntry<I, R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I, R: PartialOrd> Ord for HeapEntry<I, R> {
    fn cmp(&self, other: &Self) -> Ordering {
        Ordered::new(&self.distance).cmp(&Ordered::new(&other.distance))
    }
}

/// A bounded max-heap of the best candidates seen so far.
///
/// Holds at most `capacity` entries.  Once full, a new candidate displaces the current worst
/// entry only when strictly closer, and [admission_radius][Self::admission_radius] reports the
/// worst retained distance so callers can stop considering anything at least that far away.
#[derive(Clone, Debug)]
pub(crate) struct CandidateHeap<I, R> {
    capacity: usize,
    heap: BinaryHeap<HeapEntry<I, R>>,
}

impl<I, R: Copy + PartialOrd> CandidateHeap<I, R> {
    /// Create a heap holding at most `capacity` candidates.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Offer a candidate, keeping only the `capacity` closest.
    pub fn push(&mut self, item: I, distance: R) {
        if self.heap.len() < self.capacity {
            self.heap.push(HeapEntry { item, distance });
        } else if let Some(worst) = self.heap.peek() {
            if Ordered::new(&distance) < Ordered::new(&worst.distance) {
                self.heap.pop();
                self.heap.push(HeapEntry { item, distance });
            }
        }
    }

    /// The distance a new candidate must strictly beat, once the heap is full.
    ///
    /// `None` until `capacity` candidates have been seen; no pruning is sound before then.
    pub fn admission_radius(&self) -> Option<R> {
        if self.heap.len() == self.capacity {
            self.heap.peek().map(|entry| entry.distance)
        } else {
            None
        }
    }

    /// Extract the retained candidates, closest first.
    pub fn into_sorted(self) -> Vec<Neighbor<I, R>> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|entry| Neighbor::new(entry.item, entry.distance))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_query_validation() {
        assert!(RangeQuery::new([0.0, 0.0], 1.5).is_ok());
        assert!(RangeQuery::new([0.0, 0.0], 0.0).is_ok());
        assert_eq!(
            RangeQuery::new([0.0, 0.0], -1.0).err(),
            Some(Error::NegativeRadius)
        );
    }

    #[test]
    fn test_knn_query_validation() {
        assert!(KnnQuery::new([0.0, 0.0], 1).is_ok());
        assert_eq!(KnnQuery::new([0.0, 0.0], 0).err(), Some(Error::ZeroNeighbors));
    }

    #[test]
    fn test_diversified_query_validation() {
        assert!(DiversifiedKnnQuery::new([0.0, 0.0], 3, 0.0).is_ok());
        assert!(DiversifiedKnnQuery::new([0.0, 0.0], 3, 1.0).is_ok());

        assert_eq!(
            DiversifiedKnnQuery::new([0.0, 0.0], 0, 0.5).err(),
            Some(Error::ZeroNeighbors)
        );
        assert_eq!(
            DiversifiedKnnQuery::new([0.0, 0.0], 3, -0.1).err(),
            Some(Error::InvalidDiversityWeight { got: -0.1 })
        );
        assert_eq!(
            DiversifiedKnnQuery::new([0.0, 0.0], 3, 1.1).err(),
            Some(Error::InvalidDiversityWeight { got: 1.1 })
        );
        assert!(DiversifiedKnnQuery::new([0.0, 0.0], 3, f64::NAN).is_err());
    }

    #[test]
    fn test_heap_keeps_closest() {
        let mut heap = CandidateHeap::new(2);
        heap.push("far", 9.0);
        heap.push("near", 1.0);
        heap.push("mid", 5.0);

        let sorted = heap.into_sorted();
        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0], Neighbor::new("near", 1.0));
        assert_eq!(sorted[1], Neighbor::new("mid", 5.0));
    }

    #[test]
    fn test_heap_admission_radius() {
        let mut heap = CandidateHeap::new(2);
        assert_eq!(heap.admission_radius(), None);

        heap.push("a", 3.0);
        assert_eq!(heap.admission_radius(), None);

        heap.push("b", 7.0);
        assert_eq!(heap.admission_radius(), Some(7.0));

        heap.push("c", 5.0);
        assert_eq!(heap.admission_radius(), Some(5.0));
    }

    #[test]
    fn test_heap_ignores_ties_with_worst() {
        let mut heap = CandidateHeap::new(1);
        heap.push("first", 2.0);
        heap.push("tied", 2.0);

        let sorted = heap.into_sorted();
        assert_eq!(sorted, vec![Neighbor::new("first", 2.0)]);
    }
}
