//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Bank transactions, field values and identifiers
//! - `category`: Categories that rules assign
//! - `rule`: Categorization rules, drafts, patches and filters
//! - `outcome`: Match outcomes and batch summaries
//! - `error`: Error types for the categorization engine

pub mod category;
pub mod error;
pub mod outcome;
pub mod rule;
pub mod transaction;

pub use category::{Category, CategoryId, NewCategory};
pub use error::{CategoryError, EngineError, ValidationError, ValidationErrorKind};
pub use outcome::{
    BatchFailure, CategorizationSummary, MatchOutcome, ProcessingResult, SkippedRule,
    TransactionOutcome,
};
pub use rule::{
    CategorizationRule, ConditionType, FieldName, RuleDraft, RuleFilter, RuleId, RulePatch,
    DEFAULT_PRIORITY,
};
pub use transaction::{CompanyId, Transaction, TransactionFields, TransactionId, TransactionType};
