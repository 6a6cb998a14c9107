//! Categorization rule types
//!
//! A rule is a single `(condition_type, field_name, field_value)` triple plus a
//! target category and a priority. Lower priority values are evaluated first.

use super::category::CategoryId;
use super::transaction::CompanyId;
use std::fmt;
use std::str::FromStr;

/// Rule identifier
pub type RuleId = u32;

/// Priority assigned to rules created without an explicit one
pub const DEFAULT_PRIORITY: i32 = 1;

/// Comparison operator a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionType {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    Regex,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
}

impl ConditionType {
    pub const ALL: [ConditionType; 9] = [
        ConditionType::Contains,
        ConditionType::Equals,
        ConditionType::StartsWith,
        ConditionType::EndsWith,
        ConditionType::Regex,
        ConditionType::GreaterThan,
        ConditionType::LessThan,
        ConditionType::GreaterEqual,
        ConditionType::LessEqual,
    ];

    /// Wire name, e.g. `STARTS_WITH`
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Contains => "CONTAINS",
            ConditionType::Equals => "EQUALS",
            ConditionType::StartsWith => "STARTS_WITH",
            ConditionType::EndsWith => "ENDS_WITH",
            ConditionType::Regex => "REGEX",
            ConditionType::GreaterThan => "GREATER_THAN",
            ConditionType::LessThan => "LESS_THAN",
            ConditionType::GreaterEqual => "GREATER_EQUAL",
            ConditionType::LessEqual => "LESS_EQUAL",
        }
    }

    /// Human-readable label for operator-facing listings
    pub fn label(&self) -> &'static str {
        match self {
            ConditionType::Contains => "Contains",
            ConditionType::Equals => "Equals",
            ConditionType::StartsWith => "Starts with",
            ConditionType::EndsWith => "Ends with",
            ConditionType::Regex => "Regular expression",
            ConditionType::GreaterThan => "Greater than",
            ConditionType::LessThan => "Less than",
            ConditionType::GreaterEqual => "Greater than or equal",
            ConditionType::LessEqual => "Less than or equal",
        }
    }

    /// Ordering comparisons, only legal on `amount`
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ConditionType::GreaterThan
                | ConditionType::LessThan
                | ConditionType::GreaterEqual
                | ConditionType::LessEqual
        )
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        ConditionType::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Invalid condition type: '{}'", s.trim()))
    }
}

/// Transaction attribute a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Description,
    Amount,
    TransactionType,
    Category,
}

impl FieldName {
    pub const ALL: [FieldName; 4] = [
        FieldName::Description,
        FieldName::Amount,
        FieldName::TransactionType,
        FieldName::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Description => "description",
            FieldName::Amount => "amount",
            FieldName::TransactionType => "transaction_type",
            FieldName::Category => "category",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        FieldName::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| format!("Invalid field name: '{}'", s.trim()))
    }
}

/// A persisted categorization rule
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizationRule {
    pub id: RuleId,
    pub company: CompanyId,

    /// Category assigned on match
    pub category: CategoryId,

    /// Unique per company
    pub name: String,

    pub condition_type: ConditionType,
    pub field_name: FieldName,

    /// Raw pattern string, interpreted according to `condition_type`
    pub field_value: String,

    /// Lower values are evaluated earlier; ties are broken by ascending id
    pub priority: i32,

    pub is_active: bool,
}

impl CategorizationRule {
    /// The unsaved form of this rule
    pub fn to_draft(&self) -> RuleDraft {
        RuleDraft {
            company: self.company,
            category: self.category,
            name: self.name.clone(),
            condition_type: self.condition_type,
            field_name: self.field_name,
            field_value: self.field_value.clone(),
            priority: Some(self.priority),
            is_active: Some(self.is_active),
        }
    }

    /// Build the rule that would result from applying `patch`
    ///
    /// Fields absent from the patch keep their current value. The id and
    /// company never change.
    pub fn patched(&self, patch: &RulePatch) -> CategorizationRule {
        CategorizationRule {
            id: self.id,
            company: self.company,
            category: patch.category.unwrap_or(self.category),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            condition_type: patch.condition_type.unwrap_or(self.condition_type),
            field_name: patch.field_name.unwrap_or(self.field_name),
            field_value: patch
                .field_value
                .clone()
                .unwrap_or_else(|| self.field_value.clone()),
            priority: patch.priority.unwrap_or(self.priority),
            is_active: patch.is_active.unwrap_or(self.is_active),
        }
    }
}

/// A rule that has not been saved yet
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub company: CompanyId,
    pub category: CategoryId,
    pub name: String,
    pub condition_type: ConditionType,
    pub field_name: FieldName,
    pub field_value: String,

    /// Defaults to [`DEFAULT_PRIORITY`]
    pub priority: Option<i32>,

    /// Defaults to `true`
    pub is_active: Option<bool>,
}

impl RuleDraft {
    pub fn new(
        company: CompanyId,
        category: CategoryId,
        name: impl Into<String>,
        condition_type: ConditionType,
        field_name: FieldName,
        field_value: impl Into<String>,
    ) -> Self {
        RuleDraft {
            company,
            category,
            name: name.into(),
            condition_type,
            field_name,
            field_value: field_value.into(),
            priority: None,
            is_active: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Materialize the draft under the given id, applying defaults
    pub fn into_rule(self, id: RuleId) -> CategorizationRule {
        CategorizationRule {
            id,
            company: self.company,
            category: self.category,
            name: self.name,
            condition_type: self.condition_type,
            field_name: self.field_name,
            field_value: self.field_value,
            priority: self.priority.unwrap_or(DEFAULT_PRIORITY),
            is_active: self.is_active.unwrap_or(true),
        }
    }
}

/// Partial update of a saved rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePatch {
    pub category: Option<CategoryId>,
    pub name: Option<String>,
    pub condition_type: Option<ConditionType>,
    pub field_name: Option<FieldName>,
    pub field_value: Option<String>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
}

/// Filters for listing a company's rules
///
/// Every `None` filter accepts all rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleFilter {
    pub category: Option<CategoryId>,
    pub is_active: Option<bool>,

    /// Case-insensitive substring of the rule name or its `field_value`
    pub search: Option<String>,

    pub condition_type: Option<ConditionType>,
    pub field_name: Option<FieldName>,
}

impl RuleFilter {
    pub fn matches(&self, rule: &CategorizationRule) -> bool {
        if self.category.is_some_and(|c| c != rule.category) {
            return false;
        }
        if self.is_active.is_some_and(|a| a != rule.is_active) {
            return false;
        }
        if self.condition_type.is_some_and(|c| c != rule.condition_type) {
            return false;
        }
        if self.field_name.is_some_and(|f| f != rule.field_name) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                rule.name.to_lowercase().contains(&term)
                    || rule.field_value.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}
