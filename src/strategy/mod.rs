//! Processing strategy module for categorization runs
//!
//! This module defines the Strategy pattern for complete categorization pipelines,
//! encompassing CSV loading, batch categorization and output. This allows different
//! processing implementations (synchronous, asynchronous batch) to be selected at runtime.

use crate::cli::StrategyType;
use crate::core::RuleStore;
use crate::io::csv_format::{read_categories, read_rules};
use crate::types::{CategorizationSummary, CompanyId};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Input files and scope of one categorization run
#[derive(Debug, Clone, PartialEq)]
pub struct RunInputs {
    /// Category table CSV
    pub categories: PathBuf,

    /// Rule table CSV
    pub rules: PathBuf,

    /// Transactions CSV
    pub transactions: PathBuf,

    /// Only categorize this company; every company in the file when `None`
    pub company: Option<CompanyId>,
}

/// Processing strategy trait for complete categorization pipelines
///
/// Each strategy must be able to load the category and rule tables, read
/// transactions from a CSV file, categorize them and write the categorized
/// transactions to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Categorize transactions from the input files and write results to output
    ///
    /// # Arguments
    ///
    /// * `inputs` - Paths of the category, rule and transaction files
    /// * `output` - Mutable reference to a writer for the categorized transactions
    ///
    /// # Returns
    ///
    /// * `Ok(summaries)` - One summary per company run, by ascending company id
    /// * `Err(String)` - A fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened
    /// - The category or rule table is malformed
    /// - Output cannot be written
    ///
    /// Invalid transaction rows are logged and skipped. Per-transaction
    /// categorization failures are reported in the summaries.
    fn process(
        &self,
        inputs: &RunInputs,
        output: &mut dyn Write,
    ) -> Result<Vec<CategorizationSummary>, String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}

/// Load the category and rule tables into a rule store
///
/// Rules are loaded as persisted. Invalid ones are reported per run as
/// skipped rules.
pub(crate) fn load_rule_store(inputs: &RunInputs) -> Result<RuleStore, String> {
    let categories = read_categories(open(&inputs.categories)?)
        .map_err(|e| format!("Failed to load categories: {}", e))?;
    let rules = read_rules(open(&inputs.rules)?)
        .map_err(|e| format!("Failed to load rules: {}", e))?;

    tracing::info!(
        categories = categories.len(),
        rules = rules.len(),
        "Loaded category and rule tables"
    );

    let mut store = RuleStore::new(categories);
    store.load_rules(rules);
    Ok(store)
}

/// Companies a run covers: the requested one, or all of them
pub(crate) fn companies_to_run(
    requested: Option<CompanyId>,
    present: Vec<CompanyId>,
) -> Vec<CompanyId> {
    match requested {
        Some(company) => vec![company],
        None => present,
    }
}

fn open(path: &Path) -> Result<BufReader<File>, String> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))
}
