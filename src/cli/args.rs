use crate::strategy::{BatchConfig, RunInputs};
use crate::types::CompanyId;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Categorize bank transactions with company-scoped rules
#[derive(Parser, Debug)]
#[command(name = "categorization-engine")]
#[command(about = "Categorize bank transactions with company-scoped rules", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing transaction records
    #[arg(value_name = "TRANSACTIONS", help = "Path to the transactions CSV file")]
    pub transactions_file: PathBuf,

    /// Rule table
    #[arg(long = "rules", value_name = "RULES", help = "Path to the rules CSV file")]
    pub rules_file: PathBuf,

    /// Category table
    #[arg(
        long = "categories",
        value_name = "CATEGORIES",
        help = "Path to the categories CSV file"
    )]
    pub categories_file: PathBuf,

    /// Restrict the run to one company
    #[arg(
        long = "company",
        value_name = "ID",
        help = "Only categorize this company (default: every company in the file)"
    )]
    pub company: Option<CompanyId>,

    /// Processing strategy to use for categorizing transactions
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for sequential or 'async' for concurrent"
    )]
    pub strategy: StrategyType,

    /// Number of transactions per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of transaction rows read per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker count (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of categorization workers (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Log filter; falls back to RUST_LOG, then `warn`
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        help = "Log level or filter directive written to stderr (default: RUST_LOG or warn)"
    )]
    pub log_level: Option<String>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values use the defaults. Zero values are replaced by
    /// [`BatchConfig::new`] with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Input files and scope of the run
    pub fn to_run_inputs(&self) -> RunInputs {
        RunInputs {
            categories: self.categories_file.clone(),
            rules: self.rules_file.clone(),
            transactions: self.transactions_file.clone(),
            company: self.company,
        }
    }
}
