#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Violation fingerprints and month-to-month pattern similarity.
//!
//! [`builder`] turns monthly violation counts into per-category proportion
//! vectors, [`similarity`] compares every month against every other month
//! with cosine similarity, and [`trend`] pivots raw counts into per-year
//! monthly series. Everything here is a pure batch transform over the
//! caller's table: nothing is cached between calls.

pub mod builder;
pub mod similarity;
pub mod trend;

use thiserror::Error;

pub use builder::{FingerprintBuilder, FingerprintTable, PeriodFingerprint};
pub use similarity::{RankedPeriod, SimilarityEngine, SimilarityMatrix, cosine_similarity};
pub use trend::{YearSeries, monthly_trend};

/// Errors surfaced by fingerprint analytics.
///
/// Data-quality problems (missing categories, zero totals, all-zero
/// fingerprints) are absorbed as zeros and never reach this type.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// A period index outside the fingerprint table was requested.
    #[error("Invalid period index {index}: table has {len} periods")]
    InvalidIndex {
        /// The requested index.
        index: usize,
        /// Number of periods in the table.
        len: usize,
    },
}
