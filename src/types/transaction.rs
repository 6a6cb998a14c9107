//! Transaction-related types for the categorization engine
//!
//! Transactions are owned by the banking side of the system. The engine only
//! reads `description`, `amount` and `tx_type`, and writes `category`.

use super::category::CategoryId;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Company identifier
///
/// Every rule, transaction and non-system category belongs to one company.
pub type CompanyId = u32;

/// Transaction identifier
pub type TransactionId = u32;

/// Direction of a bank transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Money leaving the account
    Debit,

    /// Money entering the account
    Credit,
}

impl TransactionType {
    /// Canonical upper-case name, as stored by the banking backend
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "DEBIT",
            TransactionType::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBIT" => Ok(TransactionType::Debit),
            "CREDIT" => Ok(TransactionType::Credit),
            other => Err(format!("Invalid transaction type: '{}'", other)),
        }
    }
}

/// A bank transaction as seen by the categorization engine
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: TransactionId,

    /// Company that owns the bank account this transaction belongs to
    pub company: CompanyId,

    /// Free-text description from the bank statement
    pub description: String,

    /// Signed amount
    pub amount: Decimal,

    /// Debit or credit
    pub tx_type: TransactionType,

    /// Assigned category, if any
    ///
    /// Overwritten every time a rule matches. Left untouched when no rule
    /// matches.
    pub category: Option<CategoryId>,
}

impl Transaction {
    /// Create an uncategorized transaction
    pub fn new(
        id: TransactionId,
        company: CompanyId,
        description: impl Into<String>,
        amount: Decimal,
        tx_type: TransactionType,
    ) -> Self {
        Transaction {
            id,
            company,
            description: description.into(),
            amount,
            tx_type,
            category: None,
        }
    }
}

/// Caller-supplied field values for dry-run rule testing
///
/// Every field is optional: a condition on an absent field never matches.
/// Nothing here has to exist in storage. `category` is an id, read by rules
/// exactly as a stored transaction's category is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFields {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub transaction_type: Option<TransactionType>,
    pub category: Option<CategoryId>,
}

impl TransactionFields {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_transaction_type(mut self, tx_type: TransactionType) -> Self {
        self.transaction_type = Some(tx_type);
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }
}
