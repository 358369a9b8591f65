//! Vantage — [similarity search] in metric spaces.
//!
//! [similarity search]: https://en.wikipedia.org/wiki/Similarity_search
//!
//! Everything here assumes distance calls are the expensive part.  The
//! indexes ([PivotTable], [VpTree], [GhTree]) answer range and k-nearest
//! neighbor queries exactly while skipping, by the triangle inequality,
//! most of the distance calls an [ExhaustiveScan] would make, and report
//! how many they spent.

pub mod chebyshev;
pub mod coords;
pub mod distance;
pub mod error;
pub mod euclid;
pub mod exhaustive;
pub mod gh;
pub mod lp;
pub mod pivot;
pub mod protein;
pub mod query;
pub mod table;
pub mod taxi;
pub mod tree;
pub mod vp;

pub use chebyshev::{chebyshev_distance, Chebyshev};
pub use coords::Coordinates;
pub use distance::{Distance, Metric, Proximity};
pub use error::{Error, Result};
pub use euclid::{euclidean_distance, Euclidean, EuclideanDistance};
pub use exhaustive::ExhaustiveScan;
pub use gh::GhTree;
pub use lp::lp_distance;
pub use pivot::{select_pivots, PivotStrategy};
pub use protein::Protein;
pub use query::{
    DiversifiedKnnQuery, KnnQuery, KnnResult, MetricIndex, Neighbor, QueryStats, RangeQuery,
    RangeResult,
};
pub use table::PivotTable;
pub use taxi::{taxicab_distance, Taxicab};
pub use tree::{TreeConfig, TreeConfigBuilder, TreeStats};
pub use vp::VpTree;
