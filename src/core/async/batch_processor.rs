//! Batch processing with id-based partitioning for async categorization
//!
//! This module provides the `BatchProcessor` struct, which categorizes one
//! company's transactions on several tokio tasks at once.
//!
//! # Design
//!
//! The `BatchProcessor` partitions transaction ids by `id % partitions`. Each
//! id lands in exactly one partition, so no two workers ever write the same
//! transaction. Every worker matches against the same immutable
//! `Arc<RuleSnapshot>`, so the evaluation order is identical on all of them.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── Arc<RuleSnapshot>           (rules fixed for the whole run)
//!     ├── Arc<AsyncTransactionStore>  (shared transaction storage)
//!     └── CancellationToken           (checked between transactions)
//! ```
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be safely shared across async tasks.
//! All internal state is protected by Arc, and the underlying store uses
//! thread-safe components.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::AsyncTransactionStore;
use crate::core::categorizer::categorize_transaction;
use crate::core::matcher::RuleSnapshot;
use crate::types::{CompanyId, ProcessingResult, TransactionId};

/// A transaction id tagged with its position in the requested order
type Slot = (usize, TransactionId);

/// Results of one batch, restored to the requested order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResults {
    pub results: Vec<ProcessingResult>,

    /// At least one worker stopped early because the run was cancelled
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct PartitionResults {
    results: Vec<(usize, ProcessingResult)>,
    cancelled: bool,
}

/// Batch processor with id-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    company: CompanyId,
    snapshot: Arc<RuleSnapshot>,
    transactions: Arc<AsyncTransactionStore>,
    cancel: CancellationToken,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The company's rule snapshot for this run
    /// * `transactions` - Arc-wrapped store to read and write
    /// * `cancel` - Token checked before each transaction
    pub fn new(
        snapshot: Arc<RuleSnapshot>,
        transactions: Arc<AsyncTransactionStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            company: snapshot.company(),
            snapshot,
            transactions,
            cancel,
        }
    }

    /// Partition transaction ids by `id % partitions`
    ///
    /// # Arguments
    ///
    /// * `ids` - Transaction ids in requested order
    /// * `partitions` - Number of partitions (treated as 1 when 0)
    ///
    /// # Returns
    ///
    /// One vector per non-empty partition, each holding `(position, id)` pairs
    /// in requested order.
    ///
    /// # Guarantees
    ///
    /// - Each id appears in exactly one partition
    /// - Equal ids always land in the same partition
    pub fn partition_by_id(&self, ids: Vec<TransactionId>, partitions: usize) -> Vec<Vec<Slot>> {
        let partitions = partitions.max(1);
        let mut buckets: Vec<Vec<Slot>> = vec![Vec::new(); partitions];

        for (position, id) in ids.into_iter().enumerate() {
            buckets[id as usize % partitions].push((position, id));
        }

        buckets.retain(|bucket| !bucket.is_empty());
        buckets
    }

    /// Categorize one partition sequentially
    async fn process_partition(&self, slots: Vec<Slot>) -> PartitionResults {
        let mut partition = PartitionResults {
            results: Vec::with_capacity(slots.len()),
            cancelled: false,
        };

        for (position, tx_id) in slots {
            if self.cancel.is_cancelled() {
                partition.cancelled = true;
                break;
            }

            let tx = self.transactions.get(tx_id);
            let result =
                categorize_transaction(&self.snapshot, self.company, tx_id, tx, |id, category| {
                    self.transactions.assign_category(id, category)
                });
            partition.results.push((position, result));
        }

        partition
    }

    /// Categorize a batch of transaction ids concurrently
    ///
    /// This method:
    /// 1. Partitions the ids by transaction id
    /// 2. Spawns one tokio task per partition
    /// 3. Waits for all tasks to complete
    /// 4. Returns the results in requested order
    ///
    /// # Guarantees
    ///
    /// - Every id is processed at most once
    /// - Failures are captured in results and don't stop processing
    /// - A panicked worker loses only its own partition's results
    pub async fn process_batch(&self, ids: Vec<TransactionId>, partitions: usize) -> BatchResults {
        let mut tasks = Vec::new();
        for slots in self.partition_by_id(ids, partitions) {
            let processor = self.clone();
            tasks.push(tokio::spawn(
                async move { processor.process_partition(slots).await },
            ));
        }

        let mut slots = Vec::new();
        let mut cancelled = false;
        for task in tasks {
            match task.await {
                Ok(partition) => {
                    cancelled |= partition.cancelled;
                    slots.extend(partition.results);
                }
                Err(e) => {
                    tracing::error!(company = self.company, error = ?e, "Categorization task panicked");
                }
            }
        }

        slots.sort_by_key(|(position, _)| *position);
        BatchResults {
            results: slots.into_iter().map(|(_, result)| result).collect(),
            cancelled,
        }
    }
}
