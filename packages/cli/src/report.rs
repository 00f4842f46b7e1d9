//! Plain-text rendering of analysis results.

use std::fmt::Write as _;

use traffiq_fingerprint::{FingerprintTable, RankedPeriod, SimilarityEngine, YearSeries};
use traffiq_violation_models::{Fingerprint, Period, ViolationCategory};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One line per period, one percentage column per category.
#[must_use]
pub fn fingerprints(table: &FingerprintTable) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<8}", "PERIOD");
    for category in ViolationCategory::all() {
        let _ = write!(out, " {:>20}", category.display_name());
    }
    out.push('\n');

    for row in table.rows() {
        let _ = write!(out, "{:<8}", row.period);
        for (_, share) in row.fingerprint.iter() {
            let _ = write!(out, " {:>19.2}%", share * 100.0);
        }
        out.push('\n');
    }
    out
}

/// Categories of one period, largest share first.
#[must_use]
pub fn breakdown(period: Period, fingerprint: &Fingerprint) -> String {
    let mut out = format!("Violation pattern for {}\n", period.label());
    if fingerprint.is_zero() {
        out.push_str("(no violations recorded)\n");
    }
    for share in fingerprint.breakdown() {
        let _ = writeln!(
            out,
            "{:<22} {:>7.2}%",
            share.category.display_name(),
            share.percent()
        );
    }
    out
}

/// Periods ranked by similarity to `period`.
#[must_use]
pub fn ranking(period: Period, ranked: &[RankedPeriod]) -> String {
    let mut out = format!("Pattern similarity to {}\n", period.label());
    for entry in ranked {
        let _ = writeln!(
            out,
            "{:<16} {:>7.2}%",
            entry.period.label(),
            entry.percent()
        );
    }
    out
}

/// The full similarity matrix with period headers.
#[must_use]
pub fn matrix(engine: &SimilarityEngine) -> String {
    let mut out = format!("{:<8}", "");
    for period in engine.periods() {
        let _ = write!(out, " {period:>7}");
    }
    out.push('\n');

    for (period, row) in engine.periods().iter().zip(engine.matrix().rows()) {
        let _ = write!(out, "{period:<8}");
        for value in row {
            let _ = write!(out, " {value:>7.3}");
        }
        out.push('\n');
    }
    out
}

/// Monthly counts of one category, one line per year.
#[must_use]
pub fn trend(category: ViolationCategory, series: &[YearSeries]) -> String {
    let mut out = format!("Monthly {} violations\n", category.display_name());
    let _ = write!(out, "{:<6}", "YEAR");
    for month in MONTH_ABBREVIATIONS {
        let _ = write!(out, " {month:>8}");
    }
    out.push('\n');

    for year in series {
        let _ = write!(out, "{:<6}", year.year);
        for value in &year.months {
            match value {
                Some(v) => {
                    let _ = write!(out, " {v:>8.0}");
                }
                None => {
                    let _ = write!(out, " {:>8}", "-");
                }
            }
        }
        out.push('\n');
    }
    out
}
