//! Storage traits for rules and transactions
//!
//! The engine never owns persistence. Batch runs read rules and transactions
//! and write category assignments through these traits, so the same
//! categorizer runs against the in-memory stores, CSV-backed stores or any
//! database adapter.

use crate::types::{
    CategorizationRule, CategoryId, CompanyId, EngineError, Transaction, TransactionId,
    ValidationError,
};
use std::sync::RwLock;

/// Read path for a company's rule set
pub trait RuleRepository {
    /// Monotonic counter bumped on every rule change for the company
    ///
    /// Used to decide whether a cached snapshot is stale.
    fn revision(&self, company: CompanyId) -> Result<u64, EngineError>;

    /// All active rules of the company, in any order
    ///
    /// # Errors
    ///
    /// [`EngineError::RuleSetUnavailable`] when the rule set cannot be read.
    /// This aborts a batch before any transaction is touched.
    fn active_rules(&self, company: CompanyId) -> Result<Vec<CategorizationRule>, EngineError>;

    /// Check the category reference of a loaded rule
    ///
    /// Repositories that know the category table reject rules whose category
    /// is missing or belongs to another company. The default accepts every
    /// rule.
    fn check_category(&self, _rule: &CategorizationRule) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Shared rule repository that operators may edit while runs read it
///
/// A poisoned lock makes the rule set unavailable.
impl<R: RuleRepository> RuleRepository for RwLock<R> {
    fn revision(&self, company: CompanyId) -> Result<u64, EngineError> {
        self.read()
            .map_err(|e| EngineError::rule_set_unavailable(company, e))?
            .revision(company)
    }

    fn active_rules(&self, company: CompanyId) -> Result<Vec<CategorizationRule>, EngineError> {
        self.read()
            .map_err(|e| EngineError::rule_set_unavailable(company, e))?
            .active_rules(company)
    }

    fn check_category(&self, rule: &CategorizationRule) -> Result<(), ValidationError> {
        match self.read() {
            Ok(inner) => inner.check_category(rule),
            // Already reported by active_rules
            Err(_) => Ok(()),
        }
    }
}

/// Read/write path for a company's transactions
pub trait TransactionRepository {
    /// Ids of every transaction owned by the company, ascending
    fn transaction_ids(&self, company: CompanyId) -> Vec<TransactionId>;

    /// Get a transaction by ID
    fn get(&self, tx_id: TransactionId) -> Option<Transaction>;

    /// Persist a category assignment
    ///
    /// # Errors
    ///
    /// [`EngineError::TransactionNotFound`] or
    /// [`EngineError::PersistenceFailure`]; both are recorded per transaction.
    fn assign_category(
        &mut self,
        tx_id: TransactionId,
        category: CategoryId,
    ) -> Result<(), EngineError>;
}
