//! Sequential batch categorizer
//!
//! This module provides the BatchCategorizer that applies a company's rule
//! snapshot to a set of its transactions, one transaction at a time.
//!
//! A run:
//! - loads and orders the active rule set once (aborting if it is unreadable)
//! - resolves the transaction set, reporting unknown ids as failures
//! - writes the matched category of every transaction a rule matches
//! - leaves unmatched transactions untouched
//! - records per-transaction failures without stopping

use crate::core::matcher::RuleSnapshot;
use crate::core::traits::{RuleRepository, TransactionRepository};
use crate::types::{
    CategorizationSummary, CategoryId, CompanyId, EngineError, MatchOutcome, ProcessingResult,
    Transaction, TransactionId, TransactionOutcome,
};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Sequential batch categorizer
///
/// Owns a rule repository and a transaction repository.
pub struct BatchCategorizer<R, T> {
    rules: R,
    transactions: T,
}

impl<R, T> BatchCategorizer<R, T>
where
    R: RuleRepository,
    T: TransactionRepository,
{
    /// Create a new BatchCategorizer
    ///
    /// # Arguments
    ///
    /// * `rules` - Source of the company rule sets
    /// * `transactions` - Transactions to read and categorize
    pub fn new(rules: R, transactions: T) -> Self {
        BatchCategorizer {
            rules,
            transactions,
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut R {
        &mut self.rules
    }

    pub fn transactions(&self) -> &T {
        &self.transactions
    }

    pub fn into_parts(self) -> (R, T) {
        (self.rules, self.transactions)
    }

    /// Categorize a company's transactions
    ///
    /// # Arguments
    ///
    /// * `company` - Company whose rules and transactions are used
    /// * `transaction_ids` - Subset to process, or `None` for every transaction
    ///   of the company
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RuleSetUnavailable`] if the rule set cannot be
    /// read. No transaction is touched in that case. Every other failure is
    /// recorded in the summary.
    pub fn apply(
        &mut self,
        company: CompanyId,
        transaction_ids: Option<&[TransactionId]>,
    ) -> Result<CategorizationSummary, EngineError> {
        self.apply_with_cancel(company, transaction_ids, &CancellationToken::new())
    }

    /// Categorize a company's transactions, stopping early once `cancel` fires
    ///
    /// Cancellation is checked between transactions. Work done before it is
    /// kept and a later run resumes safely.
    pub fn apply_with_cancel(
        &mut self,
        company: CompanyId,
        transaction_ids: Option<&[TransactionId]>,
        cancel: &CancellationToken,
    ) -> Result<CategorizationSummary, EngineError> {
        let snapshot = RuleSnapshot::load(&self.rules, company)?;
        let ids = resolve_transaction_ids(transaction_ids, || {
            self.transactions.transaction_ids(company)
        });

        tracing::info!(
            company,
            rules = snapshot.rules().len(),
            skipped_rules = snapshot.skipped().len(),
            transactions = ids.len(),
            "Starting categorization run"
        );

        let mut summary = CategorizationSummary::new(company, snapshot.skipped().to_vec());
        for tx_id in ids {
            if cancel.is_cancelled() {
                tracing::warn!(company, "Categorization run cancelled");
                summary.cancelled = true;
                break;
            }

            let tx = self.transactions.get(tx_id);
            let transactions = &mut self.transactions;
            let result = categorize_transaction(&snapshot, company, tx_id, tx, |id, category| {
                transactions.assign_category(id, category)
            });
            summary.record(result);
        }

        log_summary(&summary);
        Ok(summary)
    }
}

/// Requested ids in first-seen order without duplicates, or every id of the
/// company when none are requested
pub(crate) fn resolve_transaction_ids<F>(
    requested: Option<&[TransactionId]>,
    all: F,
) -> Vec<TransactionId>
where
    F: FnOnce() -> Vec<TransactionId>,
{
    match requested {
        Some(ids) => {
            let mut seen = HashSet::with_capacity(ids.len());
            ids.iter().copied().filter(|id| seen.insert(*id)).collect()
        }
        None => all(),
    }
}

/// Match one transaction and persist its category through `assign`
///
/// A transaction that does not exist, or belongs to another company, is
/// reported as not found.
pub(crate) fn categorize_transaction<F>(
    snapshot: &RuleSnapshot,
    company: CompanyId,
    tx_id: TransactionId,
    tx: Option<Transaction>,
    assign: F,
) -> ProcessingResult
where
    F: FnOnce(TransactionId, CategoryId) -> Result<(), EngineError>,
{
    let outcome = match tx.filter(|tx| tx.company == company) {
        None => {
            tracing::warn!(company, tx_id, "Transaction not found");
            TransactionOutcome::Failed(EngineError::transaction_not_found(tx_id))
        }
        Some(tx) => match snapshot.match_transaction(&tx) {
            MatchOutcome::Matched { category, rule_id } => match assign(tx_id, category) {
                Ok(()) => {
                    tracing::debug!(tx_id, rule_id, category, "Transaction categorized");
                    TransactionOutcome::Categorized { category, rule_id }
                }
                Err(error) => {
                    tracing::warn!(tx_id, rule_id, %error, "Failed to persist category");
                    TransactionOutcome::Failed(error)
                }
            },
            MatchOutcome::Uncategorized => {
                tracing::debug!(tx_id, "No rule matched");
                TransactionOutcome::Uncategorized
            }
        },
    };

    ProcessingResult {
        transaction_id: tx_id,
        outcome,
    }
}

pub(crate) fn log_summary(summary: &CategorizationSummary) {
    tracing::info!(
        company = summary.company,
        categorized = summary.categorized_count,
        uncategorized = summary.uncategorized_count,
        total = summary.total_transactions,
        failures = summary.failures.len(),
        cancelled = summary.cancelled,
        "Categorization run finished"
    );
}
