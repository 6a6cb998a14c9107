//! In-memory transaction storage
//!
//! This module provides the TransactionStore used by the sequential pipeline.
//! Transactions are kept in a `BTreeMap` so per-company listings come out in
//! ascending id order without sorting.
//!
//! # Duplicate Handling
//!
//! If a duplicate transaction ID is encountered, only the
//! first occurrence is stored. Subsequent transactions with the same ID are ignored.

use crate::core::traits::TransactionRepository;
use crate::types::{CategoryId, CompanyId, EngineError, Transaction, TransactionId};
use std::collections::BTreeMap;

/// Transaction store for the sequential pipeline
///
/// Maintains a BTreeMap of transaction ID to transaction data.
pub struct TransactionStore {
    /// Map of transaction ID to transaction
    transactions: BTreeMap<TransactionId, Transaction>,
}

impl TransactionStore {
    /// Create a new empty transaction store
    ///
    /// # Returns
    ///
    /// A new TransactionStore with no stored transactions
    pub fn new() -> Self {
        TransactionStore {
            transactions: BTreeMap::new(),
        }
    }

    /// Store a transaction
    ///
    /// If a transaction with the same ID already exists, the new transaction
    /// is ignored.
    ///
    /// # Arguments
    ///
    /// * `tx` - The transaction to store
    ///
    /// # Returns
    ///
    /// `true` if the transaction was stored, `false` if the id was taken
    pub fn store(&mut self, tx: Transaction) -> bool {
        if self.transactions.contains_key(&tx.id) {
            tracing::warn!(tx_id = tx.id, "Ignoring duplicate transaction id");
            return false;
        }
        self.transactions.insert(tx.id, tx);
        true
    }

    /// Get an immutable reference to a stored transaction
    ///
    /// # Arguments
    ///
    /// * `tx_id` - The transaction identifier to lookup
    ///
    /// # Returns
    ///
    /// * `Some(&Transaction)` - If the transaction exists
    /// * `None` - If the transaction ID is not found
    pub fn get_ref(&self, tx_id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&tx_id)
    }

    /// Ids of every company that owns at least one transaction, ascending
    pub fn companies(&self) -> Vec<CompanyId> {
        let mut companies: Vec<CompanyId> =
            self.transactions.values().map(|tx| tx.company).collect();
        companies.sort_unstable();
        companies.dedup();
        companies
    }

    /// All stored transactions in ascending id order
    pub fn all(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionRepository for TransactionStore {
    fn transaction_ids(&self, company: CompanyId) -> Vec<TransactionId> {
        self.transactions
            .values()
            .filter(|tx| tx.company == company)
            .map(|tx| tx.id)
            .collect()
    }

    fn get(&self, tx_id: TransactionId) -> Option<Transaction> {
        self.transactions.get(&tx_id).cloned()
    }

    fn assign_category(
        &mut self,
        tx_id: TransactionId,
        category: CategoryId,
    ) -> Result<(), EngineError> {
        let tx = self
            .transactions
            .get_mut(&tx_id)
            .ok_or_else(|| EngineError::transaction_not_found(tx_id))?;
        tx.category = Some(category);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use rust_decimal::Decimal;

    fn tx(id: TransactionId, company: CompanyId, description: &str) -> Transaction {
        Transaction::new(
            id,
            company,
            description,
            Decimal::new(10000, 2),
            TransactionType::Debit,
        )
    }

    #[test]
    fn test_store_and_retrieve_transaction() {
        let mut store = TransactionStore::new();
        assert!(store.store(tx(1, 1, "Mercado")));

        let retrieved = store.get_ref(1).unwrap();
        assert_eq!(retrieved.company, 1);
        assert_eq!(retrieved.description, "Mercado");
        assert_eq!(retrieved.category, None);
    }

    #[test]
    fn test_duplicate_transaction_id_first_wins() {
        let mut store = TransactionStore::new();
        assert!(store.store(tx(1, 1, "first")));
        assert!(!store.store(tx(1, 2, "second")));

        let retrieved = store.get_ref(1).unwrap();
        assert_eq!(retrieved.company, 1);
        assert_eq!(retrieved.description, "first");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_transaction_ids_are_scoped_and_ascending() {
        let mut store = TransactionStore::new();
        for (id, company) in [(5, 1), (2, 2), (3, 1), (9, 1)] {
            store.store(tx(id, company, "x"));
        }
        assert_eq!(store.transaction_ids(1), vec![3, 5, 9]);
        assert_eq!(store.transaction_ids(2), vec![2]);
        assert!(store.transaction_ids(3).is_empty());
        assert_eq!(store.companies(), vec![1, 2]);
    }

    #[test]
    fn test_assign_category() {
        let mut store = TransactionStore::new();
        store.store(tx(1, 1, "x"));

        store.assign_category(1, 7).unwrap();
        assert_eq!(store.get_ref(1).unwrap().category, Some(7));

        store.assign_category(1, 8).unwrap();
        assert_eq!(store.get(1).unwrap().category, Some(8));
    }

    #[test]
    fn test_assign_category_nonexistent_transaction() {
        let mut store = TransactionStore::new();
        let result = store.assign_category(999, 1);
        assert_eq!(result, Err(EngineError::TransactionNotFound { tx: 999 }));
    }
}
