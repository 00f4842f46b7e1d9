//! Dataset registry: loads every dataset definition from embedded TOML
//! configs.
//!
//! Each `.toml` file in `packages/ingest/datasets/` is baked into the binary
//! at compile time via [`include_str!`].

use crate::dataset_def::{DatasetDefinition, parse_dataset_toml};

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[(
    "qatar_monthly_violations",
    include_str!("../datasets/qatar_monthly_violations.toml"),
)];

/// Id of the dataset used when none is specified.
pub const DEFAULT_DATASET_ID: &str = "qatar_monthly_violations";

/// Returns all embedded dataset definitions.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed. The configs are
/// compiled in, and the tests below parse every one of them.
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up an embedded dataset definition by id.
#[must_use]
pub fn dataset_by_id(id: &str) -> Option<DatasetDefinition> {
    all_datasets().into_iter().find(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_datasets() {
        assert_eq!(all_datasets().len(), DATASET_TOMLS.len());
    }

    #[test]
    fn dataset_ids_are_unique() {
        let datasets = all_datasets();
        let mut ids: Vec<&str> = datasets.iter().map(|d| d.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), DATASET_TOMLS.len());
    }

    #[test]
    fn default_dataset_exists() {
        let def = dataset_by_id(DEFAULT_DATASET_ID).unwrap();
        assert!(!def.name.is_empty());
        assert!(dataset_by_id("nope").is_none());
    }
}
