//! Synchronous processing strategy
//!
//! This module implements a single-threaded, sequential processing strategy:
//! - Loads the category and rule tables
//! - Reads transactions one row at a time with SyncReader
//! - Categorizes each company with a [`BatchCategorizer`]
//! - Writes every transaction with its final category
//!
//! This is the simplest and most predictable strategy, suitable for:
//! - Small to medium-sized datasets
//! - Debugging and testing
//! - Environments where async runtime is not available

use crate::core::{BatchCategorizer, TransactionStore};
use crate::io::sync_reader::SyncReader;
use crate::io::write_transactions_csv;
use crate::strategy::{companies_to_run, load_rule_store, ProcessingStrategy, RunInputs};
use crate::types::{CategorizationSummary, Transaction};
use std::io::Write;

/// Synchronous processing strategy
///
/// Runs companies one after another and transactions in id order within
/// each company.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        inputs: &RunInputs,
        output: &mut dyn Write,
    ) -> Result<Vec<CategorizationSummary>, String> {
        let rules = load_rule_store(inputs)?;

        let mut transactions = TransactionStore::new();
        for result in SyncReader::new(&inputs.transactions)? {
            match result {
                Ok(tx) => {
                    transactions.store(tx);
                }
                Err(e) => tracing::warn!(error = %e, "Skipping transaction row"),
            }
        }

        let companies = companies_to_run(inputs.company, transactions.companies());
        let mut categorizer = BatchCategorizer::new(rules, transactions);
        let mut summaries = Vec::with_capacity(companies.len());

        for company in companies {
            match categorizer.apply(company, None) {
                Ok(summary) => summaries.push(summary),
                Err(e) => tracing::error!(company, error = %e, "Categorization run aborted"),
            }
        }

        let (rules, transactions) = categorizer.into_parts();
        let all: Vec<Transaction> = transactions.all().cloned().collect();
        write_transactions_csv(&all, rules.categories(), output)?;

        Ok(summaries)
    }
}
