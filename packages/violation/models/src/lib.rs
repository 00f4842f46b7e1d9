#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Traffic violation taxonomy, reporting periods and fingerprint types.
//!
//! This crate defines the fixed set of violation categories published in the
//! monthly traffic statistics, along with the per-period record and the
//! derived proportion vector ("fingerprint") that the analytics crate
//! compares across months. Every vector type here is indexed by
//! [`ViolationCategory`] and always carries the full category set.

mod period;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use period::{InvalidPeriodError, Period};

/// Number of categories in the fixed violation taxonomy.
pub const CATEGORY_COUNT: usize = 10;

/// Traffic violation categories reported in the monthly statistics.
///
/// Declaration order is the fixed vector order used by [`CategoryCounts`]
/// and [`Fingerprint`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ViolationCategory {
    /// Speeding caught by radar
    OverSpeedRadar,
    /// Running a traffic signal
    TrafficSignal,
    /// Ignoring road guidelines and alarm signals
    GuidelinesAlarms,
    /// Missing or defective metallic plates
    MetallicPlates,
    /// Illegal overtaking
    Overtaking,
    /// Registration and non-renewal of vehicle forms
    Registration,
    /// Driving license offenses
    DrivingLicenses,
    /// Traffic movement offenses
    TrafficMovement,
    /// Stand-and-wait rules (parking)
    StandAndWait,
    /// Everything the source does not break out
    Other,
}

impl ViolationCategory {
    /// Returns all variants of this enum in fixed vector order.
    #[must_use]
    pub const fn all() -> &'static [Self; CATEGORY_COUNT] {
        &[
            Self::OverSpeedRadar,
            Self::TrafficSignal,
            Self::GuidelinesAlarms,
            Self::MetallicPlates,
            Self::Overtaking,
            Self::Registration,
            Self::DrivingLicenses,
            Self::TrafficMovement,
            Self::StandAndWait,
            Self::Other,
        ]
    }

    /// Position of this category in every category-indexed vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short label used in charts and tables.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OverSpeedRadar => "Over Speed (Radar)",
            Self::TrafficSignal => "Traffic Signal",
            Self::GuidelinesAlarms => "Guidelines & Alarms",
            Self::MetallicPlates => "Metallic Plates",
            Self::Overtaking => "Overtaking",
            Self::Registration => "Registration",
            Self::DrivingLicenses => "Licenses",
            Self::TrafficMovement => "Traffic Movement",
            Self::StandAndWait => "Parking",
            Self::Other => "Other",
        }
    }
}

/// What to do with a numeric source column that does not map to any
/// [`ViolationCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Ignore the column.
    #[default]
    Drop,
    /// Add the column's value to [`ViolationCategory::Other`].
    FoldIntoOther,
    /// Fail the load.
    Reject,
}

/// Raw per-category violation counts for one period.
///
/// Always holds every category; categories never set read as `0.0`.
/// Serializes as a map keyed by category, and deserializing a partial map
/// fills the missing categories with zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ViolationCategory, f64>",
    into = "BTreeMap<ViolationCategory, f64>"
)]
pub struct CategoryCounts([f64; CATEGORY_COUNT]);

impl CategoryCounts {
    /// Creates an all-zero count vector.
    #[must_use]
    pub const fn new() -> Self {
        Self([0.0; CATEGORY_COUNT])
    }

    /// Creates counts from values in fixed category order.
    #[must_use]
    pub const fn from_values(values: [f64; CATEGORY_COUNT]) -> Self {
        Self(values)
    }

    /// Count for one category.
    #[must_use]
    pub const fn get(&self, category: ViolationCategory) -> f64 {
        self.0[category.index()]
    }

    /// Overwrites the count for one category.
    pub const fn set(&mut self, category: ViolationCategory, count: f64) {
        self.0[category.index()] = count;
    }

    /// Adds to the count for one category.
    pub fn add(&mut self, category: ViolationCategory, count: f64) {
        self.0[category.index()] += count;
    }

    /// Values in fixed category order.
    #[must_use]
    pub const fn values(&self) -> &[f64; CATEGORY_COUNT] {
        &self.0
    }

    /// Iterates `(category, count)` pairs in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (ViolationCategory, f64)> + '_ {
        ViolationCategory::all()
            .iter()
            .copied()
            .zip(self.0.iter().copied())
    }
}

impl FromIterator<(ViolationCategory, f64)> for CategoryCounts {
    fn from_iter<T: IntoIterator<Item = (ViolationCategory, f64)>>(iter: T) -> Self {
        let mut counts = Self::new();
        for (category, count) in iter {
            counts.add(category, count);
        }
        counts
    }
}

impl From<BTreeMap<ViolationCategory, f64>> for CategoryCounts {
    fn from(value: BTreeMap<ViolationCategory, f64>) -> Self {
        value.into_iter().collect()
    }
}

impl From<CategoryCounts> for BTreeMap<ViolationCategory, f64> {
    fn from(value: CategoryCounts) -> Self {
        value.iter().collect()
    }
}

/// One reporting period of violation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    /// Month this row covers.
    pub period: Period,
    /// Per-category counts.
    #[serde(default)]
    pub category_counts: CategoryCounts,
    /// Total violations as published by the source. Not necessarily the sum
    /// of `category_counts`; may be zero or malformed.
    #[serde(default)]
    pub total_count: f64,
}

impl ViolationRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(period: Period, category_counts: CategoryCounts, total_count: f64) -> Self {
        Self {
            period,
            category_counts,
            total_count,
        }
    }

    /// Creates a record from whichever categories the source provided.
    /// Absent categories count as zero.
    #[must_use]
    pub fn from_partial(
        period: Period,
        counts: impl IntoIterator<Item = (ViolationCategory, f64)>,
        total_count: f64,
    ) -> Self {
        Self::new(period, counts.into_iter().collect(), total_count)
    }
}

/// Proportion of a period's total violations falling in each category.
///
/// Never contains a non-finite value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ViolationCategory, f64>",
    into = "BTreeMap<ViolationCategory, f64>"
)]
pub struct Fingerprint([f64; CATEGORY_COUNT]);

impl Fingerprint {
    /// The all-zero fingerprint of a period with no usable signal.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0.0; CATEGORY_COUNT])
    }

    /// Creates a fingerprint from shares in fixed category order.
    /// Non-finite shares become `0.0`.
    #[must_use]
    pub fn from_shares(mut shares: [f64; CATEGORY_COUNT]) -> Self {
        for share in &mut shares {
            if !share.is_finite() {
                *share = 0.0;
            }
        }
        Self(shares)
    }

    /// Share for one category.
    #[must_use]
    pub const fn get(&self, category: ViolationCategory) -> f64 {
        self.0[category.index()]
    }

    /// Shares in fixed category order.
    #[must_use]
    pub const fn values(&self) -> &[f64; CATEGORY_COUNT] {
        &self.0
    }

    /// Iterates `(category, share)` pairs in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (ViolationCategory, f64)> + '_ {
        ViolationCategory::all()
            .iter()
            .copied()
            .zip(self.0.iter().copied())
    }

    /// Whether every share is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Dot product with another fingerprint.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// Every category with its share, largest share first. Equal shares keep
    /// fixed category order.
    #[must_use]
    pub fn breakdown(&self) -> Vec<CategoryShare> {
        let mut shares: Vec<CategoryShare> = self
            .iter()
            .map(|(category, share)| CategoryShare { category, share })
            .collect();
        // Stable sort keeps category order on ties.
        shares.sort_by(|a, b| b.share.total_cmp(&a.share));
        shares
    }
}

impl From<BTreeMap<ViolationCategory, f64>> for Fingerprint {
    fn from(value: BTreeMap<ViolationCategory, f64>) -> Self {
        let mut shares = [0.0; CATEGORY_COUNT];
        for (category, share) in value {
            shares[category.index()] = share;
        }
        Self::from_shares(shares)
    }
}

impl From<Fingerprint> for BTreeMap<ViolationCategory, f64> {
    fn from(value: Fingerprint) -> Self {
        value.iter().collect()
    }
}

/// One entry of a [`Fingerprint::breakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    /// Violation category.
    pub category: ViolationCategory,
    /// Fraction of the period's total, usually in `[0, 1]`.
    pub share: f64,
}

impl CategoryShare {
    /// Share expressed as a percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.share * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_index_matches_all_order() {
        for (i, category) in ViolationCategory::all().iter().enumerate() {
            assert_eq!(category.index(), i, "{category:?} out of order");
        }
    }

    #[test]
    fn category_parses_case_insensitively() {
        let parsed: ViolationCategory = "over_speed_radar".parse().unwrap();
        assert_eq!(parsed, ViolationCategory::OverSpeedRadar);
        assert_eq!(ViolationCategory::StandAndWait.to_string(), "STAND_AND_WAIT");
    }

    #[test]
    fn partial_counts_fill_zeros() {
        let record = ViolationRecord::from_partial(
            Period::new(2023, 1).unwrap(),
            [(ViolationCategory::Overtaking, 12.0)],
            12.0,
        );
        assert!((record.category_counts.get(ViolationCategory::Overtaking) - 12.0).abs() < 1e-12);
        for category in ViolationCategory::all() {
            if *category != ViolationCategory::Overtaking {
                assert!(record.category_counts.get(*category).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn counts_deserialize_from_partial_map() {
        let counts: CategoryCounts =
            serde_json::from_value(serde_json::json!({"OTHER": 3.0})).unwrap();
        assert!((counts.get(ViolationCategory::Other) - 3.0).abs() < f64::EPSILON);
        assert_eq!(counts.iter().count(), CATEGORY_COUNT);
    }

    #[test]
    fn fingerprint_scrubs_non_finite() {
        let mut shares = [0.1; CATEGORY_COUNT];
        shares[0] = f64::NAN;
        shares[1] = f64::INFINITY;
        let fp = Fingerprint::from_shares(shares);
        assert!(fp.values().iter().all(|v| v.is_finite()));
        assert!(fp.get(ViolationCategory::OverSpeedRadar).abs() < f64::EPSILON);
    }

    #[test]
    fn breakdown_sorts_descending_with_stable_ties() {
        let mut shares = [0.0; CATEGORY_COUNT];
        shares[ViolationCategory::Overtaking.index()] = 0.5;
        shares[ViolationCategory::TrafficSignal.index()] = 0.25;
        shares[ViolationCategory::Other.index()] = 0.25;
        let breakdown = Fingerprint::from_shares(shares).breakdown();

        assert_eq!(breakdown.len(), CATEGORY_COUNT);
        assert_eq!(breakdown[0].category, ViolationCategory::Overtaking);
        assert!((breakdown[0].percent() - 50.0).abs() < 1e-9);
        assert_eq!(breakdown[1].category, ViolationCategory::TrafficSignal);
        assert_eq!(breakdown[2].category, ViolationCategory::Other);
        assert_eq!(breakdown[3].category, ViolationCategory::OverSpeedRadar);
    }
}
