//! Core business logic module
//!
//! This module contains the categorization engine components:
//! - `condition` - Condition Evaluator over transaction fields
//! - `ordering` - Deterministic rule evaluation order
//! - `matcher` - First-match-wins matching over an immutable rule snapshot
//! - `validator` - Rule validation and dry-run testing
//! - `category_table` - Flat category hierarchy keyed by id
//! - `rule_store` - In-memory rule store behind the rule boundary operations
//! - `transaction_store` - In-memory transaction storage
//! - `categorizer` - Sequential batch categorizer
//! - `traits` - Storage abstractions the categorizers run against
//! - `async` - Concurrent implementations

pub mod r#async;
pub mod categorizer;
pub mod category_table;
pub mod condition;
pub mod matcher;
pub mod ordering;
pub mod rule_store;
pub mod traits;
pub mod transaction_store;
pub mod validator;

pub use categorizer::BatchCategorizer;
pub use category_table::CategoryTable;
pub use condition::{Condition, FieldSource};
pub use matcher::{match_transaction, CompiledRule, RuleSnapshot};
pub use ordering::order_rules;
pub use r#async::{AsyncBatchCategorizer, AsyncTransactionStore, BatchProcessor, RuleCache};
pub use rule_store::{RuleStore, RuleTarget};
pub use traits::{RuleRepository, TransactionRepository};
pub use transaction_store::TransactionStore;
pub use validator::{test_draft, validate};
