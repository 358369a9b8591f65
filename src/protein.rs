//! Protein sequences under a global-alignment metric.
//!
//! This is the kind of distance the whole crate exists for: a single call
//! runs a dynamic program quadratic in the sequence lengths, so an index
//! that saves distance calls saves real time.  Costs come from the mPAM250a
//! substitution matrix over the 20 standard amino acids plus a shared
//! class for everything else.

use crate::distance::{Metric, Proximity};
use crate::error::{Error, Result};

use std::hash::{Hash, Hasher};

/// The 20 standard amino acids, in substitution-matrix order.
const AMINO_ACIDS: &str = "ARNDCQEGHILKMFPSTWYV";

/// The encoding of any other symbol.
const OTHER: u8 = 20;

/// Cost of aligning a residue against a gap.
const GAP_PENALTY: f64 = 1.0;

/// Symmetric mPAM250a substitution costs, indexed in [AMINO_ACIDS] order
/// with the "other" class last.  Zero on the diagonal; smaller means more
/// similar.
#[rustfmt::skip]
const MPAM250A: [[u8; 21]; 21] = [
    // A  R  N  D  C  Q  E  G  H  I  L  K  M  F  P  S  T  W  Y  V  other
    [0, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 5, 4, 2, 7], // A
    [2, 0, 2, 2, 4, 2, 2, 2, 2, 3, 3, 2, 2, 4, 2, 2, 2, 4, 4, 3, 7], // R
    [2, 2, 0, 2, 4, 2, 2, 2, 2, 3, 3, 2, 2, 4, 2, 2, 2, 5, 4, 2, 7], // N
    [2, 2, 2, 0, 4, 2, 2, 2, 2, 3, 3, 2, 3, 4, 2, 2, 2, 6, 4, 2, 7], // D
    [3, 4, 4, 4, 0, 4, 4, 3, 4, 3, 4, 4, 4, 4, 3, 3, 3, 7, 3, 3, 7], // C
    [2, 2, 2, 2, 4, 0, 2, 2, 2, 3, 3, 2, 2, 4, 2, 2, 2, 5, 4, 3, 7], // Q
    [2, 2, 2, 2, 4, 2, 0, 2, 2, 3, 3, 2, 3, 4, 2, 2, 2, 6, 4, 2, 7], // E
    [2, 2, 2, 2, 3, 2, 2, 0, 2, 2, 3, 2, 2, 4, 2, 2, 2, 6, 4, 2, 7], // G
    [2, 2, 2, 2, 4, 2, 2, 2, 0, 3, 3, 2, 3, 3, 2, 2, 2, 5, 3, 3, 7], // H
    [2, 3, 3, 3, 3, 3, 3, 2, 3, 0, 1, 3, 2, 2, 2, 2, 2, 5, 3, 2, 7], // I
    [2, 3, 3, 3, 4, 3, 3, 3, 3, 1, 0, 3, 1, 2, 3, 3, 2, 4, 2, 1, 7], // L
    [2, 2, 2, 2, 4, 2, 2, 2, 2, 3, 3, 0, 2, 4, 2, 2, 2, 4, 4, 3, 7], // K
    [2, 2, 2, 3, 4, 2, 3, 2, 3, 2, 1, 2, 0, 2, 2, 2, 2, 4, 3, 2, 7], // M
    [3, 4, 4, 4, 4, 4, 4, 4, 3, 2, 2, 4, 2, 0, 4, 3, 3, 3, 1, 2, 7], // F
    [2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 3, 2, 2, 4, 0, 2, 2, 5, 4, 2, 7], // P
    [2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 3, 2, 2, 3, 2, 0, 2, 5, 4, 2, 7], // S
    [2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 2, 3, 2, 2, 0, 5, 3, 2, 7], // T
    [5, 4, 5, 6, 7, 5, 6, 6, 5, 5, 4, 4, 4, 3, 5, 5, 5, 0, 4, 5, 7], // W
    [4, 4, 4, 4, 3, 4, 4, 4, 3, 3, 2, 4, 3, 1, 4, 4, 3, 4, 0, 3, 7], // Y
    [2, 3, 2, 2, 3, 3, 2, 2, 3, 2, 1, 3, 2, 2, 2, 2, 2, 5, 3, 0, 7], // V
    [7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 0], // other
];

fn encode(symbol: u8) -> u8 {
    AMINO_ACIDS
        .bytes()
        .position(|aa| aa == symbol)
        .map_or(OTHER, |i| i as u8)
}

/// Global-alignment distance by dynamic programming.
fn alignment_distance(a: &[u8], b: &[u8]) -> f64 {
    // Two rolling rows keep the table linear in space.
    let mut prev: Vec<f64> = (0..=b.len()).map(|j| j as f64 * GAP_PENALTY).collect();
    let mut current = vec![0.0; b.len() + 1];

    for (i, &ra) in a.iter().enumerate() {
        current[0] = (i + 1) as f64 * GAP_PENALTY;
        for (j, &rb) in b.iter().enumerate() {
            let substitute = prev[j] + f64::from(MPAM250A[ra as usize][rb as usize]);
            let delete = prev[j + 1] + GAP_PENALTY;
            let insert = current[j] + GAP_PENALTY;
            current[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

/// An amino-acid sequence.
///
/// Uppercased and encoded at construction; any symbol outside the 20
/// standard amino acids joins the shared "other" class, so two sequences of
/// unknown symbols can sit at distance zero without being textually equal.
/// Sequences compare equal by their uppercased text.
#[derive(Clone, Debug)]
pub struct Protein {
    sequence: String,
    encoded: Vec<u8>,
}

impl Protein {
    /// Parse a sequence.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySequence`] if `sequence` is empty.
    pub fn new(sequence: &str) -> Result<Self> {
        if sequence.is_empty() {
            return Err(Error::EmptySequence);
        }

        let sequence = sequence.to_ascii_uppercase();
        let encoded = sequence.bytes().map(encode).collect();

        Ok(Self { sequence, encoded })
    }

    /// The uppercased sequence text.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// The number of residues.
    pub fn len(&self) -> usize {
        self.encoded.len()
    }

    /// Whether the sequence is empty.  Always false: empty sequences are
    /// rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }
}

impl PartialEq for Protein {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Protein {}

impl Hash for Protein {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sequence.hash(state);
    }
}

impl Proximity for Protein {
    type Distance = f64;

    fn distance(&self, other: &Self) -> f64 {
        alignment_distance(&self.encoded, &other.encoded)
    }
}

impl Metric for Protein {}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tests::check_metric_axioms;

    fn protein(sequence: &str) -> Protein {
        Protein::new(sequence).unwrap()
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Protein::new("").err(), Some(Error::EmptySequence));
    }

    #[test]
    fn test_uppercases() {
        let p = protein("arndc");
        assert_eq!(p.sequence(), "ARNDC");
        assert_eq!(p, protein("ARNDC"));
        assert_eq!(p.distance(&protein("ARNDC")), 0.0);
    }

    #[test]
    fn test_identical_sequences() {
        let p = protein("MKTAYIAKQR");
        assert_eq!(p.distance(&p), 0.0);
        assert_eq!(p.len(), 10);
    }

    #[test]
    fn test_gap_penalties() {
        // A lone deletion costs one gap; three of them cost three.
        assert_eq!(protein("AA").distance(&protein("A")), 1.0);
        assert_eq!(protein("AAAA").distance(&protein("A")), 3.0);
    }

    #[test]
    fn test_substitution_costs() {
        // A-to-R substitutes at the matrix cost.
        assert_eq!(protein("A").distance(&protein("R")), 2.0);
        // A-to-W would cost 5, but a delete plus an insert costs 2, and the
        // alignment takes whichever is cheaper.
        assert_eq!(protein("A").distance(&protein("W")), 2.0);
    }

    #[test]
    fn test_unknown_symbols_share_a_class() {
        // B and X both fall outside the standard twenty, so they encode
        // identically and align at zero cost.
        assert_eq!(protein("X").distance(&protein("B")), 0.0);
        assert_ne!(protein("X"), protein("B"));
    }

    #[test]
    fn test_symmetry() {
        let a = protein("MKTAYIAKQR");
        let b = protein("MKTAHIAKQRGW");
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn test_metric_axioms() {
        let proteins = [
            protein("MKTAYIAKQR"),
            protein("MKTAHIAKQRGW"),
            protein("ARNDCQEGHILKMFPSTWYV"),
            protein("WWWW"),
            protein("A"),
        ];
        // Matrix sums stay well within exact f64 range, so no slack.
        check_metric_axioms(&proteins, 0.0);
    }
}
