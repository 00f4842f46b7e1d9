//! Per-year monthly series of raw category counts.

use std::collections::BTreeMap;

use serde::Serialize;
use traffiq_violation_models::{ViolationCategory, ViolationRecord};

/// One year's monthly counts for a single category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSeries {
    /// Calendar year.
    pub year: i32,
    /// Counts for January through December; `None` where the year has no
    /// record for that month.
    pub months: [Option<f64>; 12],
}

impl YearSeries {
    /// Sum of the months that have data.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.months.iter().flatten().sum()
    }
}

/// Sums `category` per (year, month) and returns one series per year,
/// earliest year first.
///
/// Non-finite counts contribute zero.
#[must_use]
pub fn monthly_trend(records: &[ViolationRecord], category: ViolationCategory) -> Vec<YearSeries> {
    let mut by_year: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();

    for record in records {
        let count = record.category_counts.get(category);
        let count = if count.is_finite() { count } else { 0.0 };
        let slot = &mut by_year.entry(record.period.year()).or_default()
            [record.period.month() as usize - 1];
        *slot = Some(slot.unwrap_or_default() + count);
    }

    by_year
        .into_iter()
        .map(|(year, months)| YearSeries { year, months })
        .collect()
}
