//! Error types for the categorization engine
//!
//! # Error Categories
//!
//! - **Validation Errors**: A rule cannot enter the active set (bad regex,
//!   incompatible field/condition pairing, non-numeric literal, bad category)
//! - **Category Errors**: Category table invariants (cycles, scope, read-only)
//! - **Batch Errors**: Missing transactions and persistence failures, recorded
//!   per transaction without aborting the batch
//! - **Fatal Errors**: An unreadable rule set, I/O and CSV failures

use super::category::CategoryId;
use super::rule::{ConditionType, FieldName, RuleId};
use super::transaction::{CompanyId, TransactionId};
use thiserror::Error;

/// Discriminant of a [`ValidationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    InvalidPattern,
    InvalidFieldCombination,
    InvalidNumericLiteral,
    UnknownCategory,
    CategoryOutOfScope,
    DuplicateName,
    EmptyName,
}

/// A rule that cannot be saved or loaded into the active set
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// REGEX pattern does not compile
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as written in the rule
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// Numeric comparison on a non-amount field
    #[error("Condition {condition} cannot be applied to field '{field}'")]
    InvalidFieldCombination {
        condition: ConditionType,
        field: FieldName,
    },

    /// Amount condition whose `field_value` is not a decimal number
    #[error("Field value '{value}' must be a valid number for {condition} on amount")]
    InvalidNumericLiteral {
        value: String,
        condition: ConditionType,
    },

    /// Target category does not exist
    #[error("Category {category} does not exist")]
    UnknownCategory { category: CategoryId },

    /// Target category belongs to another company
    #[error("Category {category} is not available to company {company}")]
    CategoryOutOfScope {
        category: CategoryId,
        company: CompanyId,
    },

    /// Rule names are unique per company
    #[error("A rule named '{name}' already exists for company {company}")]
    DuplicateName { name: String, company: CompanyId },

    #[error("Rule name must not be empty")]
    EmptyName,
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::InvalidPattern { .. } => ValidationErrorKind::InvalidPattern,
            ValidationError::InvalidFieldCombination { .. } => {
                ValidationErrorKind::InvalidFieldCombination
            }
            ValidationError::InvalidNumericLiteral { .. } => {
                ValidationErrorKind::InvalidNumericLiteral
            }
            ValidationError::UnknownCategory { .. } => ValidationErrorKind::UnknownCategory,
            ValidationError::CategoryOutOfScope { .. } => ValidationErrorKind::CategoryOutOfScope,
            ValidationError::DuplicateName { .. } => ValidationErrorKind::DuplicateName,
            ValidationError::EmptyName => ValidationErrorKind::EmptyName,
        }
    }

    /// Create an InvalidPattern error
    pub fn invalid_pattern(pattern: &str, message: impl ToString) -> Self {
        ValidationError::InvalidPattern {
            pattern: pattern.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an InvalidNumericLiteral error
    pub fn invalid_numeric_literal(value: &str, condition: ConditionType) -> Self {
        ValidationError::InvalidNumericLiteral {
            value: value.to_string(),
            condition,
        }
    }
}

/// Violations of the category table invariants
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CategoryError {
    #[error("Category {category} not found")]
    NotFound { category: CategoryId },

    #[error("Category id {category} is already in use")]
    DuplicateId { category: CategoryId },

    #[error("Setting parent {parent} on category {category} would create a cycle")]
    CycleDetected {
        category: CategoryId,
        parent: CategoryId,
    },

    #[error("Category {category} is a system category and cannot be modified")]
    SystemCategoryReadOnly { category: CategoryId },

    #[error("A category named '{name}' already exists in this scope")]
    DuplicateName { name: String },

    #[error("Parent {parent} is not in the same company as category {category}")]
    ParentOutOfScope {
        category: CategoryId,
        parent: CategoryId,
    },

    #[error("No category ids left to assign")]
    IdsExhausted,
}

/// Main error type for the categorization engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The company's rule set could not be read
    ///
    /// This is the only error that aborts a batch, and it does so before any
    /// transaction is touched.
    #[error("Rule set for company {company} is unavailable: {message}")]
    RuleSetUnavailable { company: CompanyId, message: String },

    #[error("Rule {rule} not found")]
    RuleNotFound { rule: RuleId },

    /// Every rule id has been handed out
    #[error("No rule ids left to assign")]
    RuleIdsExhausted,

    /// A company's categorization task panicked
    ///
    /// Its partial assignments may already be stored.
    #[error("Categorization worker for company {company} panicked")]
    WorkerPanicked { company: CompanyId },

    /// Transaction id is unknown, or belongs to another company
    ///
    /// Recorded as a per-transaction failure in batch runs.
    #[error("Transaction {tx} not found")]
    TransactionNotFound { tx: TransactionId },

    /// Writing a category assignment failed
    ///
    /// Recorded as a per-transaction failure in batch runs.
    #[error("Failed to persist category for transaction {tx}: {message}")]
    PersistenceFailure { tx: TransactionId, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        line: Option<u64>,
        message: String,
    },
}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        EngineError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl EngineError {
    /// Create a RuleSetUnavailable error
    pub fn rule_set_unavailable(company: CompanyId, message: impl ToString) -> Self {
        EngineError::RuleSetUnavailable {
            company,
            message: message.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(tx: TransactionId) -> Self {
        EngineError::TransactionNotFound { tx }
    }

    /// Create a PersistenceFailure error
    pub fn persistence_failure(tx: TransactionId, message: impl ToString) -> Self {
        EngineError::PersistenceFailure {
            tx,
            message: message.to_string(),
        }
    }

    /// Create a RuleNotFound error
    pub fn rule_not_found(rule: RuleId) -> Self {
        EngineError::RuleNotFound { rule }
    }
}
