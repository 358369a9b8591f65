//! The recursive framework shared by the partition trees.
//!
//! Both trees in this crate are built the same way: recursively partition the
//! working items until a leaf is allowed, with the [TreeConfig] controlling
//! leaf capacity and a minimum height, and a per-strategy [Split] doing the
//! actual partitioning.  The framework owns everything else: validation, the
//! leaf/branch decision, the degenerate-partition fallback, recursion,
//! statistics, and traversal.

use crate::distance::Proximity;
use crate::error::{Error, Result};
use crate::pivot::{rng_from_seed, select_pivots_with, PivotStrategy};

use rand::rngs::SmallRng;

/// Construction parameters for the partition trees.
///
/// Obtained from [TreeConfig::builder] or [Default], never mutated by a build.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeConfig {
    max_leaf_size: usize,
    min_height: usize,
    strategy: PivotStrategy,
    seed: Option<u64>,
    verbose: bool,
}

impl TreeConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> TreeConfigBuilder {
        TreeConfigBuilder::new()
    }

    /// The most items a leaf may hold, once the minimum height is reached.
    pub fn max_leaf_size(&self) -> usize {
        self.max_leaf_size
    }

    /// The least height (in edges) a tree must reach, dataset permitting.
    pub fn min_height(&self) -> usize {
        self.min_height
    }

    /// The pivot-selection strategy used at every branch.
    pub fn strategy(&self) -> PivotStrategy {
        self.strategy
    }

    /// The random seed, if builds should be reproducible.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Whether builds emit a debug-level summary.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether a node holding `len` items at `depth` may become a leaf.
    ///
    /// Two items or fewer always may: no partition of them produces two useful sides.  Above
    /// that, partitioning is forced until `min_height`, and then leaves are allowed up to
    /// `max_leaf_size` items.
    pub(crate) fn allows_leaf(&self, len: usize, depth: usize) -> bool {
        if len <= 2 {
            true
        } else if depth < self.min_height {
            false
        } else {
            len <= self.max_leaf_size
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 50,
            min_height: 3,
            strategy: PivotStrategy::FarthestFirst,
            seed: None,
            verbose: false,
        }
    }
}

/// Builder for [TreeConfig].
#[derive(Clone, Debug)]
pub struct TreeConfigBuilder {
    config: TreeConfig,
}

impl TreeConfigBuilder {
    fn new() -> Self {
        Self {
            config: TreeConfig::default(),
        }
    }

    /// Set the leaf capacity.
    pub fn max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.config.max_leaf_size = max_leaf_size;
        self
    }

    /// Set the minimum tree height.
    pub fn min_height(mut self, min_height: usize) -> Self {
        self.config.min_height = min_height;
        self
    }

    /// Set the pivot-selection strategy.
    pub fn strategy(mut self, strategy: PivotStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Fix the random seed for reproducible builds.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Enable or disable the debug-level build summary.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Finish the configuration.
    ///
    /// # Errors
    ///
    /// [Error::ZeroMaxLeafSize] if the leaf capacity was set to zero.
    pub fn build(self) -> Result<TreeConfig> {
        if self.config.max_leaf_size == 0 {
            Err(Error::ZeroMaxLeafSize)
        } else {
            Ok(self.config)
        }
    }
}

/// Shared state threaded through one tree build.
pub(crate) struct BuildContext<'a> {
    config: &'a TreeConfig,
    rng: SmallRng,
    /// Distance calls spent so far, pivot selection included.
    pub distance_calls: usize,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a TreeConfig) -> Self {
        Self {
            config,
            rng: rng_from_seed(config.seed()),
            distance_calls: 0,
        }
    }

    /// Choose `k` pivots from `items`, charging the distance calls to this build.
    pub fn select_pivots<T: Proximity>(&mut self, items: &[T], k: usize) -> Result<Vec<usize>> {
        select_pivots_with(
            items,
            k,
            self.config.strategy(),
            &mut self.rng,
            &mut self.distance_calls,
        )
    }
}

/// The outcome of one partitioning attempt.
pub(crate) enum Partition<T, S> {
    /// A usable split: the branch record and the two sides, both non-empty.
    Split(S, Vec<T>, Vec<T>),
    /// The items would all land on one side; the node becomes a leaf instead.
    Degenerate(Vec<T>),
}

/// A per-strategy partitioning rule.
pub(crate) trait Split<T>: Sized {
    /// Partition `items`, which hold at least three elements.
    fn split(items: Vec<T>, ctx: &mut BuildContext<'_>) -> Result<Partition<T, Self>>;

    /// The item held by the branch itself rather than by a child, if any.
    fn resident(&self) -> Option<&T>;

    /// Like [resident][Self::resident], but owned, for consuming traversals.
    fn into_resident(self) -> Option<T>;
}

/// A node of a partition tree.
#[derive(Clone, Debug)]
pub(crate) enum Node<T, S> {
    Leaf {
        items: Vec<T>,
        depth: usize,
    },
    Branch {
        split: S,
        left: Box<Node<T, S>>,
        right: Box<Node<T, S>>,
    },
}

/// Recursively build a subtree over `items`.
fn grow<T, S: Split<T>>(
    items: Vec<T>,
    depth: usize,
    ctx: &mut BuildContext<'_>,
) -> Result<Node<T, S>> {
    if ctx.config.allows_leaf(items.len(), depth) {
        return Ok(Node::Leaf { items, depth });
    }

    match S::split(items, ctx)? {
        Partition::Degenerate(items) => Ok(Node::Leaf { items, depth }),
        Partition::Split(split, left, right) => Ok(Node::Branch {
            split,
            left: Box::new(grow(left, depth + 1, ctx)?),
            right: Box::new(grow(right, depth + 1, ctx)?),
        }),
    }
}

/// Build a whole tree over `items`, returning the root and its statistics.
pub(crate) fn build_tree<T, S: Split<T>>(
    items: Vec<T>,
    config: &TreeConfig,
) -> Result<(Node<T, S>, TreeStats)> {
    if items.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let mut ctx = BuildContext::new(config);
    let root = grow(items, 0, &mut ctx)?;
    let stats = TreeStats::survey(&root, ctx.distance_calls);
    Ok((root, stats))
}

/// Shape and cost measurements of a built tree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TreeStats {
    /// Distance calls spent building, pivot selection included.
    pub build_distance_calls: usize,
    /// Edges on the longest root-to-leaf path.  A lone leaf has height 0.
    pub height: usize,
    /// Total nodes.
    pub node_count: usize,
    /// Leaf nodes.
    pub leaf_count: usize,
    /// Branch nodes.
    pub branch_count: usize,
}

impl TreeStats {
    /// Measure a built tree in one post-order pass.
    ///
    /// The height is the deepest leaf's depth, so a lone-leaf tree measures 0.
    pub(crate) fn survey<T, S>(root: &Node<T, S>, build_distance_calls: usize) -> Self {
        fn walk<T, S>(node: &Node<T, S>, stats: &mut TreeStats) {
            stats.node_count += 1;
            match node {
                Node::Leaf { depth, .. } => {
                    stats.leaf_count += 1;
                    stats.height = stats.height.max(*depth);
                }
                Node::Branch { left, right, .. } => {
                    stats.branch_count += 1;
                    walk(left, stats);
                    walk(right, stats);
                }
            }
        }

        let mut stats = TreeStats {
            build_distance_calls,
            ..Self::default()
        };
        walk(root, &mut stats);
        stats
    }
}

/// A borrowing traversal over every item a tree holds.
///
/// Yields branch residents on the way down and leaf items in storage order; each built item
/// appears exactly once.
pub(crate) struct Iter<'a, T, S> {
    nodes: Vec<&'a Node<T, S>>,
    items: std::slice::Iter<'a, T>,
}

impl<'a, T, S> Iter<'a, T, S> {
    pub fn new(root: &'a Node<T, S>) -> Self {
        Self {
            nodes: vec![root],
            items: [].iter(),
        }
    }
}

impl<'a, T, S: Split<T>> Iterator for Iter<'a, T, S> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(item);
            }

            let node = self.nodes.pop()?;
            match node {
                Node::Leaf { items, .. } => {
                    self.items = items.iter();
                }
                Node::Branch { split, left, right } => {
                    self.nodes.push(right);
                    self.nodes.push(left);
                    if let Some(item) = split.resident() {
                        return Some(item);
                    }
                }
            }
        }
    }
}

/// A consuming traversal over every item a tree holds.
pub(crate) struct IntoIter<T, S> {
    nodes: Vec<Node<T, S>>,
    items: std::vec::IntoIter<T>,
}

impl<T, S> IntoIter<T, S> {
    pub fn new(root: Node<T, S>) -> Self {
        Self {
            nodes: vec![root],
            items: Vec::new().into_iter(),
        }
    }
}

impl<T, S: Split<T>> Iterator for IntoIter<T, S> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(item);
            }

            let node = self.nodes.pop()?;
            match node {
                Node::Leaf { items, .. } => {
                    self.items = items.into_iter();
                }
                Node::Branch { split, left, right } => {
                    self.nodes.push(*right);
                    self.nodes.push(*left);
                    if let Some(item) = split.into_resident() {
                        return Some(item);
                    }
                }
            }
        }
    }
}
