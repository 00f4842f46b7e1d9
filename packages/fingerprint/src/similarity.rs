//! Cosine similarity between period fingerprints.
//!
//! Any comparison involving an all-zero fingerprint scores `0.0`, including
//! a zero fingerprint compared with itself: a month with no signal matches
//! nothing.

use serde::Serialize;
use traffiq_violation_models::{Fingerprint, Period};

use crate::FingerprintError;
use crate::builder::FingerprintTable;

/// Cosine similarity between two fingerprints, in `[-1, 1]`.
///
/// Returns `0.0` when either fingerprint is all zeros. Fingerprints with
/// the same proportions score exactly `1.0`.
#[must_use]
pub fn cosine_similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
    match (Scaled::new(a), Scaled::new(b)) {
        (Some(a), Some(b)) => a.cosine(&b),
        _ => 0.0,
    }
}

/// A fingerprint divided by its largest absolute share.
///
/// The largest component is exactly 1, so the squared norm lies in
/// `[1, CATEGORY_COUNT]` and cannot underflow. Proportional fingerprints
/// scale to identical vectors.
struct Scaled {
    unit: Fingerprint,
    squared_norm: f64,
}

impl Scaled {
    /// `None` for the all-zero fingerprint.
    fn new(fingerprint: &Fingerprint) -> Option<Self> {
        let max = fingerprint
            .values()
            .iter()
            .fold(0.0_f64, |max, v| max.max(v.abs()));
        if max == 0.0 {
            return None;
        }

        let values = *fingerprint.values();
        let unit = Fingerprint::from_shares(values.map(|v| v / max));
        Some(Self {
            squared_norm: unit.dot(&unit),
            unit,
        })
    }

    // `sqrt(x * x) == x` in IEEE arithmetic, so identical vectors give 1.0.
    fn cosine(&self, other: &Self) -> f64 {
        let value = self.unit.dot(&other.unit) / (self.squared_norm * other.squared_norm).sqrt();
        value.clamp(-1.0, 1.0)
    }
}

/// Square, symmetric matrix of pairwise period similarities.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(into = "Vec<Vec<f64>>")]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    /// Number of rows (and columns).
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Entry `(i, j)`, if both indices are in range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        (i < self.size && j < self.size).then(|| self.values[i * self.size + j])
    }

    /// Row `i`, if in range.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        (i < self.size).then(|| &self.values[i * self.size..(i + 1) * self.size])
    }

    /// Iterates rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // `max(1)` keeps `chunks` happy for the empty matrix.
        self.values.chunks(self.size.max(1))
    }
}

impl From<SimilarityMatrix> for Vec<Vec<f64>> {
    fn from(value: SimilarityMatrix) -> Self {
        value.rows().map(<[f64]>::to_vec).collect()
    }
}

/// One entry of a [`SimilarityEngine::rank`] result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPeriod {
    /// Position of the period in the fingerprint table.
    pub index: usize,
    /// The period.
    pub period: Period,
    /// Cosine similarity to the queried period.
    pub similarity: f64,
}

impl RankedPeriod {
    /// Similarity expressed as a percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.similarity * 100.0
    }
}

/// All-pairs similarity over one fingerprint table.
///
/// The matrix is computed once in [`SimilarityEngine::new`] and never
/// changes; build a new engine when the table changes.
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine {
    periods: Vec<Period>,
    matrix: SimilarityMatrix,
}

impl SimilarityEngine {
    /// Computes the similarity matrix for `table`.
    #[must_use]
    pub fn new(table: &FingerprintTable) -> Self {
        let scaled: Vec<Option<Scaled>> = table.fingerprints().map(Scaled::new).collect();
        let n = scaled.len();

        let mut matrix = SimilarityMatrix::zeros(n);
        for (i, a) in scaled.iter().enumerate() {
            // No signal: the whole row and column stay 0.
            let Some(a) = a else { continue };
            matrix.set_symmetric(i, i, 1.0);

            for (j, b) in scaled.iter().enumerate().skip(i + 1) {
                if let Some(b) = b {
                    matrix.set_symmetric(i, j, a.cosine(b));
                }
            }
        }

        log::debug!("Computed {n}x{n} similarity matrix");

        Self {
            periods: table.periods().collect(),
            matrix,
        }
    }

    /// Number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether the engine covers no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Periods in table order.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// The full similarity matrix.
    #[must_use]
    pub const fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    /// Similarity between the periods at `i` and `j`.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::InvalidIndex`] if either index is out of
    /// range.
    pub fn similarity(&self, i: usize, j: usize) -> Result<f64, FingerprintError> {
        self.check_index(i)?;
        self.check_index(j)?;
        Ok(self.matrix.get(i, j).unwrap_or_default())
    }

    /// Every period ordered by descending similarity to the period at
    /// `index`.
    ///
    /// Equal scores are ordered chronologically, except that the queried
    /// period itself always precedes anything it ties with.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::InvalidIndex`] if `index` is out of range.
    pub fn rank(&self, index: usize) -> Result<Vec<RankedPeriod>, FingerprintError> {
        self.check_index(index)?;
        let row = self.matrix.row(index).unwrap_or_default();

        let mut ranked: Vec<RankedPeriod> = self
            .periods
            .iter()
            .zip(row)
            .enumerate()
            .map(|(i, (period, similarity))| RankedPeriod {
                index: i,
                period: *period,
                similarity: *similarity,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| (a.index != index).cmp(&(b.index != index)))
                .then_with(|| a.period.cmp(&b.period))
                .then_with(|| a.index.cmp(&b.index))
        });

        Ok(ranked)
    }

    fn check_index(&self, index: usize) -> Result<(), FingerprintError> {
        if index < self.periods.len() {
            Ok(())
        } else {
            Err(FingerprintError::InvalidIndex {
                index,
                len: self.periods.len(),
            })
        }
    }
}
