//! Pivot selection.
//!
//! Every index in this crate prunes with bounds anchored at a few designated
//! reference objects, the *pivots*.  Pruning power depends almost entirely on
//! where the pivots sit, so several selection strategies are provided, all
//! choosing from the working dataset itself.

use crate::distance::{Distance, DistanceValue, Proximity};
use crate::error::{Error, Result};

use num_traits::zero;

use rand::rngs::SmallRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

/// MaxSpread examines at most this many sampled objects.
const SPREAD_SAMPLE_CAP: usize = 100;

/// A strategy for choosing pivots from a dataset.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PivotStrategy {
    /// Uniform sampling without replacement.
    Random,
    /// Farthest-first traversal: start from a random object, then repeatedly take the object
    /// farthest from its nearest already-chosen pivot.  One distance call per candidate per
    /// round.
    #[default]
    FarthestFirst,
    /// Seed with the farthest pair of a bounded random sample, then greedily add the sampled
    /// object with the largest summed distance to the pivots chosen so far.  Distance calls are
    /// bounded by the sample size, independent of the dataset size.
    MaxSpread,
    /// Alias for [FarthestFirst][PivotStrategy::FarthestFirst], kept as a distinct name for
    /// callers that configure strategies by role rather than by algorithm.
    Incremental,
}

/// Choose `k` distinct pivot positions from `data`.
///
/// `k` larger than the dataset is clamped down.  With a seed the choice is deterministic;
/// without one it varies run to run.
///
/// # Errors
///
/// [Error::EmptyDataset] if `data` is empty, [Error::ZeroPivots] if `k` is zero.
pub fn select_pivots<T: Proximity>(
    data: &[T],
    k: usize,
    strategy: PivotStrategy,
    seed: Option<u64>,
) -> Result<Vec<usize>> {
    let mut rng = rng_from_seed(seed);
    let mut distance_calls = 0;
    select_pivots_with(data, k, strategy, &mut rng, &mut distance_calls)
}

/// Create the selection rng, seeded or from OS entropy.
pub(crate) fn rng_from_seed(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// [select_pivots] against a caller-owned rng, accumulating distance calls into
/// `distance_calls` so index builds can fold selection cost into their totals.
pub(crate) fn select_pivots_with<T: Proximity>(
    data: &[T],
    k: usize,
    strategy: PivotStrategy,
    rng: &mut SmallRng,
    distance_calls: &mut usize,
) -> Result<Vec<usize>> {
    if data.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if k == 0 {
        return Err(Error::ZeroPivots);
    }
    let k = k.min(data.len());

    let pivots = match strategy {
        PivotStrategy::Random => index::sample(rng, data.len(), k).into_vec(),
        PivotStrategy::FarthestFirst | PivotStrategy::Incremental => {
            farthest_first(data, k, rng, distance_calls)
        }
        PivotStrategy::MaxSpread => max_spread(data, k, rng, distance_calls),
    };

    Ok(pivots)
}

/// Farthest-first traversal over the whole dataset.
///
/// Keeps a running minimum distance from every unchosen object to the pivot set, so each new
/// pivot costs one distance call per remaining candidate.  Ties go to the earliest candidate.
fn farthest_first<T: Proximity>(
    data: &[T],
    k: usize,
    rng: &mut SmallRng,
    distance_calls: &mut usize,
) -> Vec<usize> {
    let n = data.len();
    let mut pivots = Vec::with_capacity(k);
    let mut selected = vec![false; n];
    let mut min_dist: Vec<Option<DistanceValue<T>>> = vec![None; n];

    let first = rng.random_range(0..n);
    pivots.push(first);
    selected[first] = true;

    while pivots.len() < k {
        let newest = pivots[pivots.len() - 1];

        let mut best: Option<(usize, DistanceValue<T>)> = None;
        for i in 0..n {
            if selected[i] {
                continue;
            }

            let d = data[i].distance(&data[newest]).value();
            *distance_calls += 1;
            let nearest = match min_dist[i] {
                Some(m) if m < d => m,
                _ => d,
            };
            min_dist[i] = Some(nearest);

            let better = match best {
                Some((_, b)) => nearest > b,
                None => true,
            };
            if better {
                best = Some((i, nearest));
            }
        }

        if let Some((next, _)) = best {
            pivots.push(next);
            selected[next] = true;
        } else {
            break;
        }
    }

    pivots
}

/// Max-spread selection over a bounded sample.
///
/// The pairwise matrix over the sample is computed once and reused for both the farthest-pair
/// seed and the greedy sum-of-distances rounds, so no distance calls happen after the matrix
/// fill.
fn max_spread<T: Proximity>(
    data: &[T],
    k: usize,
    rng: &mut SmallRng,
    distance_calls: &mut usize,
) -> Vec<usize> {
    let n = data.len();
    let sample = index::sample(rng, n, n.min(SPREAD_SAMPLE_CAP)).into_vec();
    let s = sample.len();

    if s <= k {
        return sample;
    }

    // s > k >= 1, so the sample holds at least two objects.
    let mut matrix: Vec<DistanceValue<T>> = vec![zero(); s * s];
    for i in 0..s {
        for j in (i + 1)..s {
            let d = data[sample[i]].distance(&data[sample[j]]).value();
            *distance_calls += 1;
            matrix[i * s + j] = d;
            matrix[j * s + i] = d;
        }
    }

    let mut best_pair = (0, 1);
    let mut best_dist = matrix[1];
    for i in 0..s {
        for j in (i + 1)..s {
            if matrix[i * s + j] > best_dist {
                best_dist = matrix[i * s + j];
                best_pair = (i, j);
            }
        }
    }

    let mut chosen = vec![best_pair.0, best_pair.1];
    let mut in_chosen = vec![false; s];
    in_chosen[best_pair.0] = true;
    in_chosen[best_pair.1] = true;

    while chosen.len() < k {
        let mut best: Option<(usize, DistanceValue<T>)> = None;
        for cand in 0..s {
            if in_chosen[cand] {
                continue;
            }

            let mut spread = zero();
            for &c in &chosen {
                spread += matrix[cand * s + c];
            }

            let better = match best {
                Some((_, b)) => spread > b,
                None => true,
            };
            if better {
                best = Some((cand, spread));
            }
        }

        if let Some((next, _)) = best {
            chosen.push(next);
            in_chosen[next] = true;
        } else {
            break;
        }
    }

    // The farthest-pair seed can overshoot k == 1.
    chosen.truncate(k);
    chosen.into_iter().map(|i| sample[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::euclid::Euclidean;

    fn line(coords: &[f64]) -> Vec<Euclidean<[f64; 1]>> {
        coords.iter().map(|&x| Euclidean([x])).collect()
    }

    fn distinct(pivots: &[usize]) -> bool {
        let mut seen = vec![false; pivots.len().max(pivots.iter().max().map_or(0, |&m| m + 1))];
        pivots.iter().all(|&p| !std::mem::replace(&mut seen[p], true))
    }

    #[test]
    fn test_validation() {
        let data = line(&[0.0, 1.0]);

        let empty: Vec<Euclidean<[f64; 1]>> = Vec::new();
        assert_eq!(
            select_pivots(&empty, 1, PivotStrategy::Random, Some(7)).err(),
            Some(Error::EmptyDataset)
        );
        assert_eq!(
            select_pivots(&data, 0, PivotStrategy::Random, Some(7)).err(),
            Some(Error::ZeroPivots)
        );
    }

    #[test]
    fn test_clamps_to_dataset_size() {
        let data = line(&[0.0, 1.0, 2.0]);

        for strategy in [
            PivotStrategy::Random,
            PivotStrategy::FarthestFirst,
            PivotStrategy::MaxSpread,
            PivotStrategy::Incremental,
        ] {
            let pivots = select_pivots(&data, 10, strategy, Some(7)).unwrap();
            assert_eq!(pivots.len(), 3, "{strategy:?}");
            assert!(distinct(&pivots), "{strategy:?}");
        }
    }

    #[test]
    fn test_random_distinct() {
        let data = line(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let pivots = select_pivots(&data, 3, PivotStrategy::Random, Some(42)).unwrap();

        assert_eq!(pivots.len(), 3);
        assert!(distinct(&pivots));
    }

    #[test]
    fn test_seed_determinism() {
        let data = line(&[3.0, 1.0, 4.0, 1.5, 9.0, 2.0, 6.0]);

        for strategy in [
            PivotStrategy::Random,
            PivotStrategy::FarthestFirst,
            PivotStrategy::MaxSpread,
        ] {
            let a = select_pivots(&data, 3, strategy, Some(123)).unwrap();
            let b = select_pivots(&data, 3, strategy, Some(123)).unwrap();
            assert_eq!(a, b, "{strategy:?}");
        }
    }

    #[test]
    fn test_farthest_first_takes_outlier() {
        // One object is far from everything, so whatever the first pick is, the second
        // must be the object farthest from it.
        let data = line(&[0.0, 0.1, 0.2, 0.3, 100.0]);
        let pivots = select_pivots(&data, 2, PivotStrategy::FarthestFirst, Some(42)).unwrap();

        let first = pivots[0];
        let expected = (0..data.len())
            .filter(|&i| i != first)
            .max_by(|&a, &b| {
                let da = data[a].distance(&data[first]).value();
                let db = data[b].distance(&data[first]).value();
                da.partial_cmp(&db).unwrap()
            })
            .unwrap();
        assert_eq!(pivots[1], expected);
    }

    #[test]
    fn test_farthest_first_counts_calls() {
        let data = line(&[0.0, 1.0, 2.0, 3.0]);
        let mut rng = rng_from_seed(Some(7));
        let mut calls = 0;

        let pivots =
            select_pivots_with(&data, 2, PivotStrategy::FarthestFirst, &mut rng, &mut calls)
                .unwrap();

        // One round over the three unchosen candidates.
        assert_eq!(pivots.len(), 2);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_max_spread_seeds_farthest_pair() {
        let data = line(&[0.0, 1.0, 10.0]);
        let pivots = select_pivots(&data, 2, PivotStrategy::MaxSpread, Some(7)).unwrap();

        let mut sorted = pivots.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 2]);
    }

    #[test]
    fn test_max_spread_single_pivot() {
        let data = line(&[0.0, 1.0, 10.0]);
        let pivots = select_pivots(&data, 1, PivotStrategy::MaxSpread, Some(7)).unwrap();

        assert_eq!(pivots.len(), 1);
    }

    #[test]
    fn test_incremental_matches_farthest_first() {
        let data = line(&[5.0, 3.0, 8.0, 1.0, 9.0]);

        let fft = select_pivots(&data, 3, PivotStrategy::FarthestFirst, Some(11)).unwrap();
        let inc = select_pivots(&data, 3, PivotStrategy::Incremental, Some(11)).unwrap();
        assert_eq!(fft, inc);
    }
}
