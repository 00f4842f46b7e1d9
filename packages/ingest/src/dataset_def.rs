//! Config-driven violation dataset definition.
//!
//! [`DatasetDefinition`] captures everything unique about one statistics
//! export (its column names, file format and how to treat columns nobody
//! mapped) so that a single loader handles every export.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use traffiq_violation_models::{UnknownCategoryPolicy, ViolationCategory};

use crate::IngestError;

/// A complete, config-driven violation dataset definition.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"qatar_monthly_violations"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// File format. When omitted, inferred from the input file extension.
    #[serde(default)]
    pub format: Option<DataFormat>,
    /// Column holding the reporting month.
    pub period_field: String,
    /// Column holding the published total violation count.
    pub total_field: String,
    /// Source column for each violation category. Categories left out are
    /// loaded as zero.
    #[serde(deserialize_with = "deserialize_categories")]
    pub categories: BTreeMap<ViolationCategory, String>,
    /// Metadata columns that are never categories.
    #[serde(default)]
    pub ignored_fields: Vec<String>,
    /// What to do with numeric columns that are not mapped above.
    #[serde(default)]
    pub unknown_category_policy: UnknownCategoryPolicy,
}

impl DatasetDefinition {
    /// Returns the dataset id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source column for `category`, if mapped.
    #[must_use]
    pub fn column_for(&self, category: ViolationCategory) -> Option<&str> {
        self.categories.get(&category).map(String::as_str)
    }

    /// Whether `column` is the period, the total, a mapped category or an
    /// ignored field.
    #[must_use]
    pub fn is_known_column(&self, column: &str) -> bool {
        column == self.period_field
            || column == self.total_field
            || self.categories.values().any(|c| c == column)
            || self.ignored_fields.iter().any(|c| c == column)
    }

    /// Format to use for `path`: the configured one, else the file
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Format`] if neither identifies a format.
    pub fn resolve_format(&self, path: &Path) -> Result<DataFormat, IngestError> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        DataFormat::from_path(path).ok_or_else(|| IngestError::Format {
            message: format!(
                "Cannot infer format of '{}' for dataset {}: set `format` or use a .json/.csv file",
                path.display(),
                self.id
            ),
        })
    }
}

fn deserialize_categories<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<ViolationCategory, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, column)| {
            key.parse::<ViolationCategory>()
                .map(|category| (category, column))
                .map_err(|_| serde::de::Error::custom(format!("unknown violation category '{key}'")))
        })
        .collect()
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// A JSON array of flat objects.
    Json,
    /// A CSV file with a header row.
    Csv,
}

impl DataFormat {
    /// Infers the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Parses a [`DatasetDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns [`IngestError::Config`] if the TOML is malformed or missing
/// required fields.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, IngestError> {
    Ok(toml::de::from_str(toml_str)?)
}

/// Reads and parses a [`DatasetDefinition`] from a TOML file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or parsed.
pub fn load_dataset_toml(path: &Path) -> Result<DatasetDefinition, IngestError> {
    let contents = std::fs::read_to_string(path)?;
    parse_dataset_toml(&contents)
}
