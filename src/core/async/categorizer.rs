//! Categorization orchestration for async batch processing
//!
//! This module provides the `AsyncBatchCategorizer` struct, which runs
//! categorization batches on the tokio runtime.
//!
//! # Design
//!
//! A run takes the company's snapshot from the `RuleCache` (rebuilding it if
//! the repository revision moved), resolves the transaction ids and hands them
//! to a `BatchProcessor`, which spreads them over worker tasks. Different
//! companies share nothing mutable beyond the cache, so
//! [`AsyncBatchCategorizer::apply_all`] runs them in parallel.
//!
//! # Architecture
//!
//! ```text
//! AsyncBatchCategorizer
//!     ├── Arc<R: RuleRepository>      (shared rule source)
//!     ├── Arc<AsyncTransactionStore>  (thread-safe transaction storage)
//!     └── Arc<RuleCache>              (compiled snapshots per company)
//! ```
//!
//! # Thread Safety
//!
//! The categorizer is cloneable and every clone shares the same rule source,
//! store and cache.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{AsyncTransactionStore, BatchProcessor, RuleCache};
use crate::core::categorizer::{log_summary, resolve_transaction_ids};
use crate::core::traits::RuleRepository;
use crate::types::{CategorizationSummary, CompanyId, EngineError, TransactionId};

/// Categorization orchestrator for async batch processing
#[derive(Debug)]
pub struct AsyncBatchCategorizer<R> {
    rules: Arc<R>,
    transactions: Arc<AsyncTransactionStore>,
    cache: Arc<RuleCache>,

    /// Number of partitions each run is split into
    workers: usize,
}

impl<R> Clone for AsyncBatchCategorizer<R> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            transactions: Arc::clone(&self.transactions),
            cache: Arc::clone(&self.cache),
            workers: self.workers,
        }
    }
}

impl<R> AsyncBatchCategorizer<R>
where
    R: RuleRepository + Send + Sync + 'static,
{
    /// Create a new AsyncBatchCategorizer
    ///
    /// # Arguments
    ///
    /// * `rules` - Arc-wrapped rule repository
    /// * `transactions` - Arc-wrapped AsyncTransactionStore
    /// * `workers` - Concurrent tasks per run (treated as 1 when 0)
    pub fn new(rules: Arc<R>, transactions: Arc<AsyncTransactionStore>, workers: usize) -> Self {
        Self {
            rules,
            transactions,
            cache: Arc::new(RuleCache::new()),
            workers: workers.max(1),
        }
    }

    pub fn rules(&self) -> &Arc<R> {
        &self.rules
    }

    pub fn transactions(&self) -> &Arc<AsyncTransactionStore> {
        &self.transactions
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    /// Categorize a company's transactions
    ///
    /// Same contract as the sequential
    /// [`BatchCategorizer::apply`](crate::core::BatchCategorizer::apply).
    /// Outcomes are reported in requested order even though they are produced
    /// concurrently.
    pub async fn apply(
        &self,
        company: CompanyId,
        transaction_ids: Option<Vec<TransactionId>>,
    ) -> Result<CategorizationSummary, EngineError> {
        self.apply_with_cancel(company, transaction_ids, CancellationToken::new())
            .await
    }

    /// Categorize a company's transactions, stopping early once `cancel` fires
    pub async fn apply_with_cancel(
        &self,
        company: CompanyId,
        transaction_ids: Option<Vec<TransactionId>>,
        cancel: CancellationToken,
    ) -> Result<CategorizationSummary, EngineError> {
        let snapshot = self.cache.get_or_load(self.rules.as_ref(), company)?;
        let ids = resolve_transaction_ids(transaction_ids.as_deref(), || {
            self.transactions.transaction_ids(company)
        });

        tracing::info!(
            company,
            rules = snapshot.rules().len(),
            skipped_rules = snapshot.skipped().len(),
            transactions = ids.len(),
            workers = self.workers,
            "Starting categorization run"
        );

        let mut summary = CategorizationSummary::new(company, snapshot.skipped().to_vec());
        let processor = BatchProcessor::new(snapshot, Arc::clone(&self.transactions), cancel);
        let batch = processor.process_batch(ids, self.workers).await;

        for result in batch.results {
            summary.record(result);
        }
        if batch.cancelled {
            tracing::warn!(company, "Categorization run cancelled");
            summary.cancelled = true;
        }

        log_summary(&summary);
        Ok(summary)
    }

    /// Categorize every listed company concurrently, one task per company
    ///
    /// # Returns
    ///
    /// One result per company, in the order given. A company whose rule set
    /// is unavailable gets an error without affecting the others, and so does
    /// one whose task panicked ([`EngineError::WorkerPanicked`]).
    pub async fn apply_all(
        &self,
        companies: &[CompanyId],
    ) -> Vec<(CompanyId, Result<CategorizationSummary, EngineError>)> {
        let mut tasks = Vec::with_capacity(companies.len());
        for &company in companies {
            let categorizer = self.clone();
            tasks.push((
                company,
                tokio::spawn(async move { categorizer.apply(company, None).await }),
            ));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (company, task) in tasks {
            match task.await {
                Ok(result) => results.push((company, result)),
                Err(e) => {
                    tracing::error!(company, error = ?e, "Company categorization task panicked");
                    results.push((company, Err(EngineError::WorkerPanicked { company })));
                }
            }
        }
        results
    }
}
