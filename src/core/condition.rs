//! Condition evaluation
//!
//! A rule's raw `(condition_type, field_name, field_value)` triple is compiled
//! once into a [`Condition`]. Compilation is where every validation error is
//! raised: regex patterns are built, numeric literals are parsed and illegal
//! field pairings are rejected. Evaluating a compiled condition cannot fail.
//!
//! # Semantics
//!
//! - `CONTAINS`, `STARTS_WITH`, `ENDS_WITH`: case-insensitive test on the string
//!   form of the field. An empty pattern matches every present field.
//! - `EQUALS`: case-insensitive string equality, or exact numeric equality when
//!   the field is `amount`.
//! - `REGEX`: case-insensitive search anywhere in the string form of the field.
//! - `GREATER_THAN`, `LESS_THAN`, `GREATER_EQUAL`, `LESS_EQUAL`: numeric
//!   comparison against `amount` only.
//!
//! A condition on a field the transaction does not carry never matches.

use crate::types::{
    ConditionType, FieldName, Transaction, TransactionFields, ValidationError,
};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::str::FromStr;

/// Read access to the transaction attributes a rule can inspect
///
/// Implemented for stored [`Transaction`]s and for caller-supplied
/// [`TransactionFields`], so rules can be evaluated against either.
pub trait FieldSource {
    /// String form of a field, or `None` if absent
    fn text(&self, field: FieldName) -> Option<Cow<'_, str>>;

    /// The amount, if present
    fn amount(&self) -> Option<Decimal>;
}

impl FieldSource for Transaction {
    fn text(&self, field: FieldName) -> Option<Cow<'_, str>> {
        match field {
            FieldName::Description => Some(Cow::Borrowed(self.description.as_str())),
            FieldName::Amount => Some(Cow::Owned(self.amount.to_string())),
            FieldName::TransactionType => Some(Cow::Borrowed(self.tx_type.as_str())),
            FieldName::Category => self.category.map(|c| Cow::Owned(c.to_string())),
        }
    }

    fn amount(&self) -> Option<Decimal> {
        Some(self.amount)
    }
}

impl FieldSource for TransactionFields {
    fn text(&self, field: FieldName) -> Option<Cow<'_, str>> {
        match field {
            FieldName::Description => self.description.as_deref().map(Cow::Borrowed),
            FieldName::Amount => self.amount.map(|a| Cow::Owned(a.to_string())),
            FieldName::TransactionType => {
                self.transaction_type.map(|t| Cow::Borrowed(t.as_str()))
            }
            FieldName::Category => self.category.map(|c| Cow::Owned(c.to_string())),
        }
    }

    fn amount(&self) -> Option<Decimal> {
        self.amount
    }
}

/// A compiled, infallible condition
#[derive(Debug, Clone)]
pub enum Condition {
    /// Lower-cased needle
    Contains { field: FieldName, needle: String },
    /// Lower-cased value
    Equals { field: FieldName, value: String },
    AmountEquals(Decimal),
    StartsWith { field: FieldName, prefix: String },
    EndsWith { field: FieldName, suffix: String },
    Regex { field: FieldName, pattern: Regex },
    /// `amount <op> threshold`, where `condition` is one of the four numeric
    /// condition types
    Compare {
        condition: ConditionType,
        threshold: Decimal,
    },
}

impl Condition {
    /// Compile a raw rule triple
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidFieldCombination`] for a numeric comparison on
    ///   any field other than `amount`
    /// - [`ValidationError::InvalidNumericLiteral`] when an amount comparison or
    ///   amount equality has a `field_value` that is not a decimal
    /// - [`ValidationError::InvalidPattern`] when a REGEX pattern does not compile
    pub fn compile(
        condition_type: ConditionType,
        field: FieldName,
        field_value: &str,
    ) -> Result<Self, ValidationError> {
        match condition_type {
            ConditionType::Contains => Ok(Condition::Contains {
                field,
                needle: field_value.to_lowercase(),
            }),
            ConditionType::Equals if field == FieldName::Amount => {
                parse_decimal(field_value, condition_type).map(Condition::AmountEquals)
            }
            ConditionType::Equals => Ok(Condition::Equals {
                field,
                value: field_value.to_lowercase(),
            }),
            ConditionType::StartsWith => Ok(Condition::StartsWith {
                field,
                prefix: field_value.to_lowercase(),
            }),
            ConditionType::EndsWith => Ok(Condition::EndsWith {
                field,
                suffix: field_value.to_lowercase(),
            }),
            ConditionType::Regex => RegexBuilder::new(field_value)
                .case_insensitive(true)
                .build()
                .map(|pattern| Condition::Regex { field, pattern })
                .map_err(|e| ValidationError::invalid_pattern(field_value, e)),
            ConditionType::GreaterThan
            | ConditionType::LessThan
            | ConditionType::GreaterEqual
            | ConditionType::LessEqual => {
                if field != FieldName::Amount {
                    return Err(ValidationError::InvalidFieldCombination {
                        condition: condition_type,
                        field,
                    });
                }
                Ok(Condition::Compare {
                    condition: condition_type,
                    threshold: parse_decimal(field_value, condition_type)?,
                })
            }
        }
    }

    /// The field this condition inspects
    pub fn field(&self) -> FieldName {
        match self {
            Condition::Contains { field, .. }
            | Condition::Equals { field, .. }
            | Condition::StartsWith { field, .. }
            | Condition::EndsWith { field, .. }
            | Condition::Regex { field, .. } => *field,
            Condition::AmountEquals(_) | Condition::Compare { .. } => FieldName::Amount,
        }
    }

    /// Evaluate against one transaction
    pub fn evaluate<S: FieldSource + ?Sized>(&self, source: &S) -> bool {
        match self {
            Condition::Contains { field, needle } => {
                lowered(source, *field).is_some_and(|text| text.contains(needle.as_str()))
            }
            Condition::Equals { field, value } => {
                lowered(source, *field).is_some_and(|text| text == *value)
            }
            Condition::StartsWith { field, prefix } => {
                lowered(source, *field).is_some_and(|text| text.starts_with(prefix.as_str()))
            }
            Condition::EndsWith { field, suffix } => {
                lowered(source, *field).is_some_and(|text| text.ends_with(suffix.as_str()))
            }
            Condition::Regex { field, pattern } => source
                .text(*field)
                .is_some_and(|text| pattern.is_match(&text)),
            Condition::AmountEquals(expected) => source.amount() == Some(*expected),
            Condition::Compare {
                condition,
                threshold,
            } => source
                .amount()
                .is_some_and(|amount| accepts(*condition, amount.cmp(threshold))),
        }
    }
}

/// Compile and evaluate a raw triple against one transaction
///
/// Prefer compiling once with [`Condition::compile`] when the same rule is
/// evaluated against many transactions.
pub fn evaluate<S: FieldSource + ?Sized>(
    condition_type: ConditionType,
    field: FieldName,
    field_value: &str,
    source: &S,
) -> Result<bool, ValidationError> {
    Ok(Condition::compile(condition_type, field, field_value)?.evaluate(source))
}

fn lowered<S: FieldSource + ?Sized>(source: &S, field: FieldName) -> Option<String> {
    source.text(field).map(|text| text.to_lowercase())
}

fn parse_decimal(value: &str, condition: ConditionType) -> Result<Decimal, ValidationError> {
    Decimal::from_str(value.trim())
        .map_err(|_| ValidationError::invalid_numeric_literal(value, condition))
}

fn accepts(condition: ConditionType, ordering: Ordering) -> bool {
    match condition {
        ConditionType::GreaterThan => ordering == Ordering::Greater,
        ConditionType::LessThan => ordering == Ordering::Less,
        ConditionType::GreaterEqual => ordering != Ordering::Less,
        ConditionType::LessEqual => ordering != Ordering::Greater,
        _ => false,
    }
}
