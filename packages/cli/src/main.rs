#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI entry point for traffic violation pattern analysis.
//!
//! Loads a monthly violation export, builds per-month fingerprints and
//! prints breakdowns, similarity rankings, the similarity matrix or monthly
//! trends as text or JSON.

mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use traffiq_fingerprint::{FingerprintBuilder, FingerprintTable, SimilarityEngine, monthly_trend};
use traffiq_ingest::dataset_def::{DatasetDefinition, load_dataset_toml};
use traffiq_ingest::{DEFAULT_DATASET_ID, IngestError, all_datasets, dataset_by_id, load_records};
use traffiq_violation_models::{Period, ViolationCategory, ViolationRecord};

#[derive(Parser)]
#[command(name = "traffiq", about = "Traffic violation pattern analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Violation statistics export (JSON or CSV)
    #[arg(long)]
    input: PathBuf,
    /// Dataset definition TOML describing the export's columns
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Embedded dataset definition to use when `--dataset` is not given
    #[arg(long, default_value = DEFAULT_DATASET_ID)]
    dataset_id: String,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List embedded dataset definitions
    Datasets,
    /// Print every month's fingerprint
    Fingerprints {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print one month's categories, largest share first
    Breakdown {
        /// Month to show (e.g., "2023-05")
        #[arg(long)]
        month: Period,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Rank every month by similarity to one month
    Similar {
        /// Month to compare against (e.g., "2023-05")
        #[arg(long)]
        month: Period,
        /// Maximum number of months to print
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the month-to-month similarity matrix
    Matrix {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print monthly counts of one category per year
    Trend {
        /// Violation category (e.g., `OVER_SPEED_RADAR`)
        #[arg(long)]
        category: ViolationCategory,
        #[command(flatten)]
        input: InputArgs,
    },
}

impl InputArgs {
    fn definition(&self) -> Result<DatasetDefinition, IngestError> {
        if let Some(path) = &self.dataset {
            return load_dataset_toml(path);
        }
        dataset_by_id(&self.dataset_id).ok_or_else(|| IngestError::UnknownDataset {
            id: self.dataset_id.clone(),
        })
    }

    fn load(&self) -> Result<Vec<ViolationRecord>, IngestError> {
        let definition = self.definition()?;
        log::debug!(
            "[{}] Using dataset definition '{}'",
            definition.id(),
            definition.name()
        );
        load_records(&definition, &self.input)
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> serde_json::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text());
        }
        Ok(())
    }
}

fn position(table: &FingerprintTable, month: Period) -> Result<usize, Box<dyn std::error::Error>> {
    table
        .position(month)
        .ok_or_else(|| format!("No data for {month} in the input").into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Datasets => {
            println!("{:<28} NAME", "ID");
            println!("{}", "-".repeat(60));
            for dataset in &all_datasets() {
                println!("{:<28} {}", dataset.id(), dataset.name());
            }
        }
        Commands::Fingerprints { input } => {
            let table = FingerprintBuilder::new().build(&input.load()?);
            input.emit(&table, || report::fingerprints(&table))?;
        }
        Commands::Breakdown { month, input } => {
            let table = FingerprintBuilder::new().build(&input.load()?);
            let fingerprint = table.rows()[position(&table, month)?].fingerprint;
            input.emit(&fingerprint.breakdown(), || {
                report::breakdown(month, &fingerprint)
            })?;
        }
        Commands::Similar {
            month,
            limit,
            input,
        } => {
            let table = FingerprintBuilder::new().build(&input.load()?);
            let index = position(&table, month)?;
            let mut ranked = SimilarityEngine::new(&table).rank(index)?;
            if let Some(limit) = limit {
                ranked.truncate(limit);
            }
            input.emit(&ranked, || report::ranking(month, &ranked))?;
        }
        Commands::Matrix { input } => {
            let table = FingerprintBuilder::new().build(&input.load()?);
            let engine = SimilarityEngine::new(&table);
            input.emit(engine.matrix(), || report::matrix(&engine))?;
        }
        Commands::Trend { category, input } => {
            let series = monthly_trend(&input.load()?, category);
            input.emit(&series, || report::trend(category, &series))?;
        }
    }

    Ok(())
}
