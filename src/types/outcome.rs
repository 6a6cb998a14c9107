//! Match outcomes and batch run summaries

use super::category::CategoryId;
use super::error::{EngineError, ValidationError};
use super::rule::RuleId;
use super::transaction::{CompanyId, TransactionId};
use std::collections::BTreeMap;

/// Result of running the matcher over one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The first rule (in evaluation order) whose condition held
    Matched {
        category: CategoryId,
        rule_id: RuleId,
    },

    /// No active, valid rule matched. This is a valid terminal state.
    Uncategorized,
}

impl MatchOutcome {
    pub fn category(&self) -> Option<CategoryId> {
        match self {
            MatchOutcome::Matched { category, .. } => Some(*category),
            MatchOutcome::Uncategorized => None,
        }
    }
}

/// A loaded rule excluded from a run because it failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRule {
    pub rule_id: RuleId,
    pub error: ValidationError,
}

/// What happened to one transaction in a batch run
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// A rule matched and the new category was persisted
    Categorized {
        category: CategoryId,
        rule_id: RuleId,
    },

    /// No rule matched; the stored category was left untouched
    Uncategorized,

    /// The transaction was missing or its write failed
    Failed(EngineError),
}

/// Outcome of one transaction, as produced by a batch worker
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    pub transaction_id: TransactionId,
    pub outcome: TransactionOutcome,
}

/// A per-transaction failure recorded in a batch summary
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub transaction_id: TransactionId,
    pub reason: EngineError,
}

/// Aggregate result of one batch run for a company
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizationSummary {
    pub company: CompanyId,

    /// Transactions whose category was assigned and persisted
    pub categorized_count: usize,

    /// Transactions that exist and were processed
    ///
    /// Requested ids that do not exist are reported in `failures` only.
    pub total_transactions: usize,

    /// Processed transactions no rule matched
    pub uncategorized_count: usize,

    pub failures: Vec<BatchFailure>,

    /// Rules excluded from this run because they failed validation
    pub skipped_rules: Vec<SkippedRule>,

    /// Number of transactions each rule categorized
    pub rule_hits: BTreeMap<RuleId, usize>,

    /// Per-transaction outcomes, in processing order
    pub outcomes: Vec<ProcessingResult>,

    /// The run stopped early; remaining transactions were not touched
    pub cancelled: bool,
}

impl CategorizationSummary {
    pub fn new(company: CompanyId, skipped_rules: Vec<SkippedRule>) -> Self {
        CategorizationSummary {
            company,
            categorized_count: 0,
            total_transactions: 0,
            uncategorized_count: 0,
            failures: Vec::new(),
            skipped_rules,
            rule_hits: BTreeMap::new(),
            outcomes: Vec::new(),
            cancelled: false,
        }
    }

    /// Fold one transaction's result into the counts
    pub fn record(&mut self, result: ProcessingResult) {
        match &result.outcome {
            TransactionOutcome::Categorized { rule_id, .. } => {
                self.total_transactions += 1;
                self.categorized_count += 1;
                *self.rule_hits.entry(*rule_id).or_default() += 1;
            }
            TransactionOutcome::Uncategorized => {
                self.total_transactions += 1;
                self.uncategorized_count += 1;
            }
            TransactionOutcome::Failed(reason) => {
                if !matches!(reason, EngineError::TransactionNotFound { .. }) {
                    self.total_transactions += 1;
                }
                self.failures.push(BatchFailure {
                    transaction_id: result.transaction_id,
                    reason: reason.clone(),
                });
            }
        }
        self.outcomes.push(result);
    }

    /// Share of processed transactions that were categorized (0.0 when empty)
    pub fn categorization_rate(&self) -> f64 {
        if self.total_transactions == 0 {
            return 0.0;
        }
        self.categorized_count as f64 / self.total_transactions as f64
    }
}
