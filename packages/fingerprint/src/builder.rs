//! Fingerprint construction.
//!
//! A fingerprint is each category's share of the period's published total.
//! Periods with a zero, negative or non-finite total carry no signal and
//! get the all-zero fingerprint.

use serde::{Deserialize, Serialize};
use traffiq_violation_models::{
    CATEGORY_COUNT, Fingerprint, Period, ViolationCategory, ViolationRecord,
};

/// A fingerprint paired with the period it describes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFingerprint {
    /// Month the fingerprint describes.
    pub period: Period,
    /// Category shares for that month.
    pub fingerprint: Fingerprint,
}

/// Fingerprints for a whole table, in the same order as the input records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintTable {
    rows: Vec<PeriodFingerprint>,
}

impl FingerprintTable {
    /// Rows in input order.
    #[must_use]
    pub fn rows(&self) -> &[PeriodFingerprint] {
        &self.rows
    }

    /// Number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PeriodFingerprint> {
        self.rows.get(index)
    }

    /// Position of `period` in the table.
    #[must_use]
    pub fn position(&self, period: Period) -> Option<usize> {
        self.rows.iter().position(|row| row.period == period)
    }

    /// Periods in table order.
    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.rows.iter().map(|row| row.period)
    }

    /// Fingerprints in table order.
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> + '_ {
        self.rows.iter().map(|row| &row.fingerprint)
    }
}

impl FromIterator<PeriodFingerprint> for FingerprintTable {
    fn from_iter<T: IntoIterator<Item = PeriodFingerprint>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Builds fingerprints from violation records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintBuilder;

impl FingerprintBuilder {
    /// Creates a builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the fingerprint of one record.
    #[must_use]
    pub fn fingerprint(&self, record: &ViolationRecord) -> Fingerprint {
        let total = record.total_count;
        if !(total.is_finite() && total > 0.0) {
            return Fingerprint::zero();
        }

        let mut shares = [0.0; CATEGORY_COUNT];
        for category in ViolationCategory::all() {
            shares[category.index()] = record.category_counts.get(*category) / total;
        }

        // `from_shares` zeroes anything non-finite (e.g. a NaN count).
        Fingerprint::from_shares(shares)
    }

    /// Computes fingerprints for every record, preserving order.
    #[must_use]
    pub fn build(&self, records: &[ViolationRecord]) -> FingerprintTable {
        let table: FingerprintTable = records
            .iter()
            .map(|record| {
                let fingerprint = self.fingerprint(record);
                if fingerprint.is_zero() {
                    log::debug!(
                        "Period {} has no usable signal (total {}), using zero fingerprint",
                        record.period,
                        record.total_count
                    );
                }
                PeriodFingerprint {
                    period: record.period,
                    fingerprint,
                }
            })
            .collect();

        log::debug!("Built {} fingerprints", table.len());

        table
    }
}
