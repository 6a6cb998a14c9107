//! Transaction Categorization Engine Library
//! # Overview
//!
//! This library assigns a category to each bank transaction by evaluating a
//! company-scoped, priority-ordered list of categorization rules. Rule sets
//! and transactions are loaded from CSV and processed with either a sync or
//! an async strategy.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, Category, CategorizationRule, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::condition`] - Condition evaluation over transaction fields
//!   - [`core::ordering`] - Rule evaluation order
//!   - [`core::matcher`] - First-match-wins rule matching
//!   - [`core::validator`] - Rule validation and dry runs
//!   - [`core::rule_store`] - Rule management operations
//!   - [`core::categorizer`] - Batch categorization of a company's transactions
//! - [`io`] - CSV formats and readers
//! - [`strategy`] - End-to-end processing pipelines
//!
//! # Rule Evaluation
//!
//! Rules are evaluated by ascending `priority`, ties broken by ascending id.
//! The first active, valid rule whose condition holds assigns its category.
//! A transaction no rule matches keeps its existing category.
//!
//! # Conditions
//!
//! - **Text**: CONTAINS, EQUALS, STARTS_WITH, ENDS_WITH and REGEX, all
//!   case-insensitive, on any field
//! - **Amount**: EQUALS and the ordering comparisons GREATER_THAN, LESS_THAN,
//!   GREATER_EQUAL and LESS_EQUAL, compared as decimals

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{BatchCategorizer, CategoryTable, RuleStore, TransactionStore};
pub use io::write_transactions_csv;
pub use types::{
    CategorizationRule, CategorizationSummary, Category, CategoryId, CompanyId, ConditionType,
    EngineError, FieldName, MatchOutcome, Transaction, TransactionId, TransactionType,
    ValidationError,
};
