//! Asynchronous batch processing strategy
//!
//! This module provides an asynchronous, multi-threaded implementation of the
//! ProcessingStrategy trait. Transactions are loaded in batches, then every
//! company is categorized concurrently with id-partitioned workers.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── AsyncBatchCategorizer (one task per company)
//!         ├── RuleCache (compiled rule snapshots per company)
//!         ├── BatchProcessor (id partitioning + tokio tasks)
//!         └── AsyncTransactionStore (thread-safe transaction storage)
//! ```
//!
//! # Thread-Based Parallelism
//!
//! - Companies are independent and run as separate tasks
//! - Within a company, transactions are partitioned by id so no two workers
//!   ever write the same transaction
//! - Worker threads come from a tokio multi-threaded runtime
//! - Shared state is `Arc` + DashMap

use crate::core::r#async::{AsyncBatchCategorizer, AsyncTransactionStore};
use crate::io::async_reader::AsyncReader;
use crate::io::write_transactions_csv;
use crate::strategy::{companies_to_run, load_rule_store, ProcessingStrategy, RunInputs};
use crate::types::CategorizationSummary;
use std::io::Write;
use std::sync::Arc;

/// Configuration for batch processing
///
/// Controls how many transaction rows are read per batch and the number of
/// worker threads used for categorization.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of transaction rows read per batch
    pub batch_size: usize,
    /// Worker threads, and partitions per company run
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                default = default.batch_size,
                "Invalid batch_size (0), using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                default = default.max_concurrent_batches,
                "Invalid max_concurrent_batches (0), using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// # Configuration
///
/// The strategy accepts a BatchConfig with:
/// - `batch_size`: Rows per read batch (default: 1000)
/// - `max_concurrent_batches`: Number of worker threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy with the specified configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Categorize transactions from the input files and write results to output
    ///
    /// 1. Loads the category and rule tables
    /// 2. Creates a tokio multi-threaded runtime
    /// 3. Reads transactions in batches into an AsyncTransactionStore
    /// 4. Categorizes every company concurrently
    /// 5. Writes every transaction with its final category
    ///
    /// A company whose run aborts is logged and left out of the summaries.
    fn process(
        &self,
        inputs: &RunInputs,
        output: &mut dyn Write,
    ) -> Result<Vec<CategorizationSummary>, String> {
        let rules = Arc::new(load_rule_store(inputs)?);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let transactions = Arc::new(AsyncTransactionStore::new());

        let results = runtime.block_on(async {
            let path = &inputs.transactions;
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

            // csv-async reads from futures::io, not tokio::io
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }
                for tx in batch {
                    transactions.store(tx);
                }
            }

            let companies = companies_to_run(inputs.company, transactions.companies());
            let categorizer = AsyncBatchCategorizer::new(
                Arc::clone(&rules),
                Arc::clone(&transactions),
                self.config.max_concurrent_batches,
            );
            Ok::<_, String>(categorizer.apply_all(&companies).await)
        })?;

        let mut summaries = Vec::with_capacity(results.len());
        for (company, result) in results {
            match result {
                Ok(summary) => summaries.push(summary),
                Err(e) => tracing::error!(company, error = %e, "Categorization run aborted"),
            }
        }

        write_transactions_csv(&transactions.all_transactions(), rules.categories(), output)?;

        Ok(summaries)
    }
}
