//! Shared transaction storage for the concurrent categorizer
//!
//! Transactions live in a `DashMap` keyed by id. Batch workers own disjoint
//! partitions of transaction ids, so category writes never contend on the
//! same entry, and readers only hold a shard lock for the duration of a clone.

use crate::types::{CategoryId, CompanyId, EngineError, Transaction, TransactionId};
use dashmap::DashMap;

/// Concurrent counterpart of [`TransactionStore`](crate::core::TransactionStore)
///
/// All methods take `&self`, so one store can be shared through an `Arc`
/// by every company task and partition worker of a run.
#[derive(Debug)]
pub struct AsyncTransactionStore {
    /// Concurrent HashMap storing transactions by transaction ID
    transactions: DashMap<TransactionId, Transaction>,
}

impl AsyncTransactionStore {
    pub fn new() -> Self {
        Self {
            transactions: DashMap::new(),
        }
    }
}

impl Default for AsyncTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncTransactionStore {
    /// Add a transaction unless its id is already taken
    ///
    /// A repeated id keeps the first transaction and logs a warning.
    ///
    /// # Returns
    ///
    /// `true` if the transaction was stored, `false` if the id was taken
    pub fn store(&self, transaction: Transaction) -> bool {
        let tx_id = transaction.id;
        let mut stored = false;
        self.transactions.entry(tx_id).or_insert_with(|| {
            stored = true;
            transaction
        });
        if !stored {
            tracing::warn!(tx_id, "Ignoring duplicate transaction id");
        }
        stored
    }

    /// Get a transaction from the store (read-only, thread-safe)
    ///
    /// The transaction is cloned to avoid holding locks longer than necessary.
    ///
    /// # Returns
    ///
    /// * `Some(Transaction)` - If the transaction exists
    /// * `None` - If the transaction is not found
    pub fn get(&self, tx_id: TransactionId) -> Option<Transaction> {
        self.transactions
            .get(&tx_id)
            .map(|entry| entry.value().clone())
    }

    /// Persist a category assignment (atomic per transaction)
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the transaction was found and updated
    /// * `Err(EngineError::TransactionNotFound)` - If the transaction doesn't exist
    pub fn assign_category(
        &self,
        tx_id: TransactionId,
        category: CategoryId,
    ) -> Result<(), EngineError> {
        match self.transactions.get_mut(&tx_id) {
            Some(mut entry) => {
                entry.value_mut().category = Some(category);
                Ok(())
            }
            None => Err(EngineError::transaction_not_found(tx_id)),
        }
    }

    /// Ids of every transaction owned by the company, ascending
    pub fn transaction_ids(&self, company: CompanyId) -> Vec<TransactionId> {
        let mut ids: Vec<TransactionId> = self
            .transactions
            .iter()
            .filter(|entry| entry.value().company == company)
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of every company that owns at least one transaction, ascending
    pub fn companies(&self) -> Vec<CompanyId> {
        let mut companies: Vec<CompanyId> = self
            .transactions
            .iter()
            .map(|entry| entry.value().company)
            .collect();
        companies.sort_unstable();
        companies.dedup();
        companies
    }

    /// Clone of every transaction, ascending by id
    pub fn all_transactions(&self) -> Vec<Transaction> {
        let mut all: Vec<Transaction> = self
            .transactions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|tx| tx.id);
        all
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
