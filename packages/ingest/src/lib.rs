#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Loader for monthly traffic violation statistics.
//!
//! Reads a JSON or CSV export described by a [`DatasetDefinition`] and
//! normalizes every row into a fixed-schema [`ViolationRecord`]: category
//! columns the export lacks are loaded as zero, blank cells are zero, and
//! the published total is passed through as-is (the fingerprint builder
//! handles zero and malformed totals). Records come back sorted by month.

pub mod dataset_def;
pub mod parsing;
pub mod reader;
pub mod registry;

use std::collections::BTreeSet;
use std::path::Path;

use traffiq_violation_models::{
    CategoryCounts, Period, UnknownCategoryPolicy, ViolationCategory, ViolationRecord,
};

use crate::dataset_def::{DataFormat, DatasetDefinition};
use crate::parsing::{Cell, classify, value_to_string};
use crate::reader::{RawRow, read_csv_rows, read_json_rows};

pub use registry::{DEFAULT_DATASET_ID, all_datasets, dataset_by_id};

/// Errors that can occur while loading a violation dataset.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset definition TOML is invalid.
    #[error("Dataset definition error: {0}")]
    Config(#[from] toml::de::Error),

    /// Input does not have the expected shape.
    #[error("Format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },

    /// A row's period cell is missing or unparseable.
    #[error("Row {row}: invalid period {value:?}")]
    InvalidPeriod {
        /// Zero-based row number in the source.
        row: usize,
        /// The raw period cell, if present.
        value: Option<String>,
    },

    /// A category cell holds something other than a number.
    #[error("{period}: column '{column}' is not a number: {value:?}")]
    InvalidValue {
        /// Period of the offending row.
        period: Period,
        /// Source column.
        column: String,
        /// Raw cell text.
        value: String,
    },

    /// Two rows share a period.
    #[error("Duplicate period {period}")]
    DuplicatePeriod {
        /// The repeated period.
        period: Period,
    },

    /// A numeric column maps to no category and the dataset rejects those.
    #[error("{period}: unrecognized violation category column '{column}'")]
    UnknownCategory {
        /// Period of the offending row.
        period: Period,
        /// Source column.
        column: String,
    },

    /// No embedded dataset definition has this id.
    #[error("Unknown dataset '{id}'")]
    UnknownDataset {
        /// The requested id.
        id: String,
    },
}

/// Reads and normalizes the file at `path`.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read, has the wrong
/// shape, or contains invalid periods, duplicate periods, non-numeric
/// category cells, or rejected unknown columns.
pub fn load_records(
    definition: &DatasetDefinition,
    path: &Path,
) -> Result<Vec<ViolationRecord>, IngestError> {
    let format = definition.resolve_format(path)?;
    log::info!(
        "[{}] Loading {} as {format:?}",
        definition.id,
        path.display()
    );

    let rows = match format {
        DataFormat::Json => read_json_rows(&std::fs::read_to_string(path)?)?,
        DataFormat::Csv => read_csv_rows(std::fs::File::open(path)?)?,
    };

    normalize_rows(definition, &rows)
}

/// Parses and normalizes in-memory text.
///
/// # Errors
///
/// See [`load_records`].
pub fn load_str(
    definition: &DatasetDefinition,
    format: DataFormat,
    text: &str,
) -> Result<Vec<ViolationRecord>, IngestError> {
    let rows = match format {
        DataFormat::Json => read_json_rows(text)?,
        DataFormat::Csv => read_csv_rows(text.as_bytes())?,
    };
    normalize_rows(definition, &rows)
}

/// Normalizes raw rows into records sorted by period.
///
/// # Errors
///
/// Returns [`IngestError`] for invalid or duplicate periods, non-numeric
/// category cells, and unknown numeric columns under
/// [`UnknownCategoryPolicy::Reject`].
pub fn normalize_rows(
    definition: &DatasetDefinition,
    rows: &[RawRow],
) -> Result<Vec<ViolationRecord>, IngestError> {
    warn_missing_columns(definition, rows);

    let mut unmapped: BTreeSet<&str> = BTreeSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let period = parse_period(definition, i, row)?;

        let mut counts = CategoryCounts::new();
        for (category, column) in &definition.categories {
            let count = match classify(row.get(column)) {
                Cell::Number(n) => n,
                Cell::Blank => 0.0,
                Cell::Text(value) => {
                    return Err(IngestError::InvalidValue {
                        period,
                        column: column.clone(),
                        value,
                    });
                }
            };
            counts.add(*category, count);
        }

        let total_count = match classify(row.get(&definition.total_field)) {
            Cell::Number(n) => n,
            Cell::Blank => 0.0,
            Cell::Text(value) => {
                log::warn!(
                    "[{}] {period}: total {value:?} is not a number",
                    definition.id
                );
                f64::NAN
            }
        };

        for (column, value) in row {
            if definition.is_known_column(column) {
                continue;
            }
            let Cell::Number(n) = classify(Some(value)) else {
                continue;
            };
            match definition.unknown_category_policy {
                UnknownCategoryPolicy::Drop => {}
                UnknownCategoryPolicy::FoldIntoOther => {
                    counts.add(ViolationCategory::Other, n);
                }
                UnknownCategoryPolicy::Reject => {
                    return Err(IngestError::UnknownCategory {
                        period,
                        column: column.clone(),
                    });
                }
            }
            unmapped.insert(column.as_str());
        }

        records.push(ViolationRecord::new(period, counts, total_count));
    }

    for column in &unmapped {
        match definition.unknown_category_policy {
            UnknownCategoryPolicy::FoldIntoOther => log::warn!(
                "[{}] Folding unmapped column '{column}' into {}",
                definition.id,
                ViolationCategory::Other
            ),
            _ => log::warn!(
                "[{}] Dropping unmapped column '{column}'",
                definition.id
            ),
        }
    }

    records.sort_by_key(|r| r.period);
    if let Some(pair) = records.windows(2).find(|w| w[0].period == w[1].period) {
        return Err(IngestError::DuplicatePeriod {
            period: pair[0].period,
        });
    }

    log::info!(
        "[{}] Loaded {} monthly records",
        definition.id,
        records.len()
    );

    Ok(records)
}

fn parse_period(
    definition: &DatasetDefinition,
    row_index: usize,
    row: &RawRow,
) -> Result<Period, IngestError> {
    let raw = row
        .get(&definition.period_field)
        .filter(|v| !v.is_null())
        .map(value_to_string);

    raw.as_deref()
        .and_then(|s| s.parse::<Period>().ok())
        .ok_or(IngestError::InvalidPeriod {
            row: row_index,
            value: raw,
        })
}

/// Logs every mapped column that no row contains. Those categories load as
/// zero for the whole dataset.
fn warn_missing_columns(definition: &DatasetDefinition, rows: &[RawRow]) {
    if rows.is_empty() {
        return;
    }

    let missing: Vec<&str> = definition
        .categories
        .values()
        .map(String::as_str)
        .chain(std::iter::once(definition.total_field.as_str()))
        .filter(|column| rows.iter().all(|row| !row.contains_key(*column)))
        .collect();

    if !missing.is_empty() {
        log::warn!(
            "[{}] Missing columns, loading as zero: {missing:?}",
            definition.id
        );
    }

    for category in ViolationCategory::all() {
        if definition.column_for(*category).is_none() {
            log::debug!(
                "[{}] No column mapped for {category}, loading as zero",
                definition.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset_def::parse_dataset_toml;
    use traffiq_fingerprint::{FingerprintBuilder, SimilarityEngine};

    use traffiq_violation_models::ViolationCategory::{OverSpeedRadar, Overtaking};

    const SPEED: &str = "lsr_lzy_d_lrdr_over_speed_radar";
    const OVERTAKING: &str = "mkhlft_ltjwz_overtaking_violations";
    const OTHER: &str = "khr_other";
    const TOTAL: &str = "mjmw_lmkhlft_lmrwry_total_traffic_violations";

    fn qatar() -> DatasetDefinition {
        dataset_by_id(DEFAULT_DATASET_ID).unwrap()
    }

    fn rows(value: &serde_json::Value) -> Vec<RawRow> {
        read_json_rows(&value.to_string()).unwrap()
    }

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn normalizes_and_sorts_by_month() {
        let input = serde_json::json!([
            {"month": "2021-02", SPEED: 40, OVERTAKING: 10, TOTAL: 60},
            {"month": "2021-01", SPEED: 80, OVERTAKING: "20", TOTAL: "100"},
        ]);
        let records = normalize_rows(&qatar(), &rows(&input)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].period, period("2021-01"));
        assert_eq!(records[1].period, period("2021-02"));
        assert!((records[0].category_counts.get(Overtaking) - 20.0).abs() < f64::EPSILON);
        assert!((records[0].total_count - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_columns_and_blanks_load_as_zero() {
        let input = serde_json::json!([
            {"month": "2021-01", SPEED: null, TOTAL: 10},
            {"month": "2021-02", SPEED: "NaN"},
        ]);
        let records = normalize_rows(&qatar(), &rows(&input)).unwrap();

        for record in &records {
            assert!(record.category_counts.values().iter().all(|v| *v == 0.0));
        }
        assert!(records[1].total_count.abs() < f64::EPSILON);
    }

    #[test]
    fn negative_total_passes_through() {
        let input = serde_json::json!([{"month": "2021-01", SPEED: 5, TOTAL: -1}]);
        let records = normalize_rows(&qatar(), &rows(&input)).unwrap();
        assert!((records[0].total_count + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_category_cell_is_an_error() {
        let input = serde_json::json!([{"month": "2021-01", SPEED: "lots", TOTAL: 5}]);
        assert!(matches!(
            normalize_rows(&qatar(), &rows(&input)),
            Err(IngestError::InvalidValue { .. })
        ));
    }

    #[test]
    fn non_numeric_total_reaches_core_as_nan() {
        let input = serde_json::json!([{"month": "2021-01", SPEED: 5, TOTAL: "pending"}]);
        let records = normalize_rows(&qatar(), &rows(&input)).unwrap();
        assert!(records[0].total_count.is_nan());
    }

    #[test]
    fn bad_or_missing_period_is_an_error() {
        let input = serde_json::json!([{"month": "soon", TOTAL: 5}]);
        assert!(matches!(
            normalize_rows(&qatar(), &rows(&input)),
            Err(IngestError::InvalidPeriod { row: 0, value: Some(_) })
        ));

        let input = serde_json::json!([{TOTAL: 5}]);
        assert!(matches!(
            normalize_rows(&qatar(), &rows(&input)),
            Err(IngestError::InvalidPeriod { row: 0, value: None })
        ));
    }

    #[test]
    fn duplicate_period_is_an_error() {
        let input = serde_json::json!([
            {"month": "2021-01", TOTAL: 1},
            {"month": "2021-01-01T00:00:00", TOTAL: 2},
        ]);
        assert!(matches!(
            normalize_rows(&qatar(), &rows(&input)),
            Err(IngestError::DuplicatePeriod { .. })
        ));
    }

    #[test]
    fn unknown_columns_follow_policy() {
        let input = serde_json::json!([
            {"month": "2021-01", OTHER: 1, "tailgating": 4, "note": "provisional", TOTAL: 10},
        ]);
        let raw = rows(&input);

        let mut def = qatar();
        def.unknown_category_policy = UnknownCategoryPolicy::Drop;
        let records = normalize_rows(&def, &raw).unwrap();
        assert!((records[0].category_counts.get(ViolationCategory::Other) - 1.0).abs() < 1e-12);

        def.unknown_category_policy = UnknownCategoryPolicy::FoldIntoOther;
        let records = normalize_rows(&def, &raw).unwrap();
        assert!((records[0].category_counts.get(ViolationCategory::Other) - 5.0).abs() < 1e-12);

        def.unknown_category_policy = UnknownCategoryPolicy::Reject;
        let err = normalize_rows(&def, &raw).unwrap_err();
        assert!(
            matches!(&err, IngestError::UnknownCategory { column, .. } if column == "tailgating"),
            "unexpected error: {err}"
        );

        def.ignored_fields.push("tailgating".to_string());
        assert!(normalize_rows(&def, &raw).is_ok());
    }

    #[test]
    fn loads_csv_text() {
        let def = parse_dataset_toml(
            r#"
            id = "csv"
            name = "CSV"
            period_field = "Month"
            total_field = "Total"

            [categories]
            OVER_SPEED_RADAR = "Speed"
            OVERTAKING = "Overtaking"
            "#,
        )
        .unwrap();
        let text = "Month,Speed,Overtaking,Total\n2020-03,\"1,200\",300,1500\n2020-02,,5,5\n";
        let records = load_str(&def, DataFormat::Csv, text).unwrap();

        assert_eq!(records[0].period, period("2020-02"));
        assert!(records[0].category_counts.get(OverSpeedRadar).abs() < f64::EPSILON);
        assert!((records[1].category_counts.get(OverSpeedRadar) - 1200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn loads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("traffiq_ingest_{}.json", std::process::id()));
        std::fs::write(
            &path,
            serde_json::json!([{"month": "2020-01", SPEED: 3, TOTAL: 3}]).to_string(),
        )
        .unwrap();
        let records = load_records(&qatar(), &path);
        std::fs::remove_file(&path).ok();

        assert_eq!(records.unwrap().len(), 1);
    }

    #[test]
    fn loaded_records_feed_the_similarity_engine() {
        let input = serde_json::json!([
            {"month": "2020-01", SPEED: 80, OVERTAKING: 20, TOTAL: 100},
            {"month": "2020-02", SPEED: 8, OVERTAKING: 2, TOTAL: 10},
            {"month": "2020-03", TOTAL: 0},
        ]);
        let records = normalize_rows(&qatar(), &rows(&input)).unwrap();
        let table = FingerprintBuilder::new().build(&records);
        let engine = SimilarityEngine::new(&table);

        assert!((engine.similarity(0, 1).unwrap() - 1.0).abs() < 1e-9);
        assert!(engine.similarity(2, 2).unwrap().abs() < f64::EPSILON);
        assert_eq!(engine.rank(0).unwrap()[0].index, 0);
    }
}
