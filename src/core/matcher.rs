//! Rule matching
//!
//! A [`RuleSnapshot`] is the ordered, compiled and immutable rule set of one
//! company, taken at the start of a batch run. Matching walks it in order and
//! stops at the first rule whose condition holds.

use crate::core::condition::{Condition, FieldSource};
use crate::core::ordering::order_rules;
use crate::core::traits::RuleRepository;
use crate::types::{
    CategorizationRule, CategoryId, CompanyId, EngineError, MatchOutcome, RuleId, SkippedRule,
    ValidationError,
};

/// A validated rule ready for evaluation
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: RuleId,
    pub category: CategoryId,
    pub priority: i32,
    pub name: String,
    condition: Condition,
}

impl CompiledRule {
    /// Compile a rule's condition
    ///
    /// # Errors
    ///
    /// Any [`ValidationError`] raised by [`Condition::compile`].
    pub fn compile(rule: &CategorizationRule) -> Result<Self, ValidationError> {
        let condition = Condition::compile(rule.condition_type, rule.field_name, &rule.field_value)?;
        Ok(CompiledRule {
            id: rule.id,
            category: rule.category,
            priority: rule.priority,
            name: rule.name.clone(),
            condition,
        })
    }

    pub fn matches<S: FieldSource + ?Sized>(&self, source: &S) -> bool {
        self.condition.evaluate(source)
    }
}

/// First-match-wins over rules already in evaluation order
pub fn match_transaction<S: FieldSource + ?Sized>(
    source: &S,
    ordered_rules: &[CompiledRule],
) -> MatchOutcome {
    ordered_rules
        .iter()
        .find(|rule| rule.matches(source))
        .map_or(MatchOutcome::Uncategorized, |rule| MatchOutcome::Matched {
            category: rule.category,
            rule_id: rule.id,
        })
}

/// Immutable, ordered rule set of one company
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    company: CompanyId,
    revision: u64,
    rules: Vec<CompiledRule>,
    skipped: Vec<SkippedRule>,
}

impl RuleSnapshot {
    /// Order and compile a set of rules
    ///
    /// Inactive rules are dropped. Rules failing `check` or compilation are
    /// excluded and reported in [`RuleSnapshot::skipped`].
    pub fn build<F>(
        company: CompanyId,
        revision: u64,
        rules: Vec<CategorizationRule>,
        check: F,
    ) -> Self
    where
        F: Fn(&CategorizationRule) -> Result<(), ValidationError>,
    {
        let mut compiled = Vec::new();
        let mut skipped = Vec::new();

        for rule in order_rules(rules) {
            match check(&rule).and_then(|()| CompiledRule::compile(&rule)) {
                Ok(compiled_rule) => compiled.push(compiled_rule),
                Err(error) => {
                    tracing::warn!(
                        company,
                        rule_id = rule.id,
                        %error,
                        "Skipping rule that failed validation"
                    );
                    skipped.push(SkippedRule {
                        rule_id: rule.id,
                        error,
                    });
                }
            }
        }

        RuleSnapshot {
            company,
            revision,
            rules: compiled,
            skipped,
        }
    }

    /// Take a snapshot of a company's active rules
    ///
    /// # Errors
    ///
    /// [`EngineError::RuleSetUnavailable`] if the repository cannot produce the
    /// rule set. Invalid individual rules are never an error here.
    pub fn load<R: RuleRepository + ?Sized>(
        repository: &R,
        company: CompanyId,
    ) -> Result<Self, EngineError> {
        let revision = repository.revision(company).map_err(|e| unavailable(company, e))?;
        let rules = repository
            .active_rules(company)
            .map_err(|e| unavailable(company, e))?;

        Ok(Self::build(company, revision, rules, |rule| {
            repository.check_category(rule)
        }))
    }

    /// First-match-wins over this snapshot
    pub fn match_transaction<S: FieldSource + ?Sized>(&self, source: &S) -> MatchOutcome {
        match_transaction(source, &self.rules)
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Valid rules in evaluation order
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Rules excluded because they failed validation
    pub fn skipped(&self) -> &[SkippedRule] {
        &self.skipped
    }
}

/// Wrap a repository error as an unavailable rule set, once
pub(crate) fn unavailable(company: CompanyId, error: EngineError) -> EngineError {
    match error {
        EngineError::RuleSetUnavailable { .. } => error,
        other => EngineError::rule_set_unavailable(company, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ConditionType, FieldName, RuleDraft, Transaction, TransactionType, ValidationErrorKind,
    };
    use rust_decimal::Decimal;

    fn rule(
        id: RuleId,
        priority: i32,
        condition: ConditionType,
        field: FieldName,
        value: &str,
        category: CategoryId,
    ) -> CategorizationRule {
        RuleDraft::new(1, category, format!("rule-{id}"), condition, field, value)
            .with_priority(priority)
            .into_rule(id)
    }

    fn accept(_: &CategorizationRule) -> Result<(), ValidationError> {
        Ok(())
    }

    fn tx(description: &str, amount: i64, tx_type: TransactionType) -> Transaction {
        Transaction::new(1, 1, description, Decimal::new(amount, 2), tx_type)
    }

    #[test]
    fn test_lower_priority_number_wins() {
        let category_a = 10;
        let category_b = 20;
        let snapshot = RuleSnapshot::build(
            1,
            0,
            vec![
                rule(2, 2, ConditionType::Contains, FieldName::Description, "sal", category_b),
                rule(1, 1, ConditionType::Contains, FieldName::Description, "salario", category_a),
            ],
            accept,
        );

        let outcome =
            snapshot.match_transaction(&tx("Pagamento salario mensal", 100, TransactionType::Credit));
        assert_eq!(
            outcome,
            MatchOutcome::Matched {
                category: category_a,
                rule_id: 1
            }
        );
    }

    #[test]
    fn test_credit_type_rule_matches_salary() {
        let receitas = 3;
        let snapshot = RuleSnapshot::build(
            1,
            0,
            vec![rule(
                1,
                1,
                ConditionType::Equals,
                FieldName::TransactionType,
                "CREDIT",
                receitas,
            )],
            accept,
        );

        let outcome = snapshot.match_transaction(&tx("Salário", 500000, TransactionType::Credit));
        assert_eq!(outcome.category(), Some(receitas));
    }

    #[test]
    fn test_no_match_is_uncategorized() {
        let snapshot = RuleSnapshot::build(
            1,
            0,
            vec![rule(1, 1, ConditionType::Contains, FieldName::Description, "aluguel", 1)],
            accept,
        );
        let outcome = snapshot.match_transaction(&tx("Mercado", 100, TransactionType::Debit));
        assert_eq!(outcome, MatchOutcome::Uncategorized);
        assert_eq!(outcome.category(), None);
    }

    #[test]
    fn test_empty_rule_set_is_uncategorized() {
        let snapshot = RuleSnapshot::build(1, 0, Vec::new(), accept);
        let outcome = snapshot.match_transaction(&tx("Mercado", 100, TransactionType::Debit));
        assert_eq!(outcome, MatchOutcome::Uncategorized);
    }

    #[test]
    fn test_invalid_rules_are_skipped_not_fatal() {
        let snapshot = RuleSnapshot::build(
            1,
            0,
            vec![
                rule(1, 1, ConditionType::Regex, FieldName::Description, "(mercado", 1),
                rule(2, 2, ConditionType::GreaterThan, FieldName::Description, "10", 2),
                rule(3, 3, ConditionType::Contains, FieldName::Description, "mercado", 3),
            ],
            accept,
        );

        assert_eq!(snapshot.rules().len(), 1);
        assert_eq!(snapshot.skipped().len(), 2);
        assert_eq!(snapshot.skipped()[0].rule_id, 1);
        assert_eq!(snapshot.skipped()[0].error.kind(), ValidationErrorKind::InvalidPattern);
        assert_eq!(
            snapshot.skipped()[1].error.kind(),
            ValidationErrorKind::InvalidFieldCombination
        );

        let outcome = snapshot.match_transaction(&tx("Mercado Livre", 100, TransactionType::Debit));
        assert_eq!(outcome.category(), Some(3));
    }

    #[test]
    fn test_check_failures_are_skipped() {
        let snapshot = RuleSnapshot::build(
            1,
            0,
            vec![rule(1, 1, ConditionType::Contains, FieldName::Description, "x", 99)],
            |rule| Err(ValidationError::UnknownCategory { category: rule.category }),
        );
        assert!(snapshot.rules().is_empty());
        assert_eq!(
            snapshot.skipped()[0].error,
            ValidationError::UnknownCategory { category: 99 }
        );
    }

    #[test]
    fn test_snapshot_keeps_evaluation_order() {
        let snapshot = RuleSnapshot::build(
            1,
            4,
            vec![
                rule(5, 2, ConditionType::Contains, FieldName::Description, "a", 1),
                rule(3, 2, ConditionType::Contains, FieldName::Description, "b", 1),
                rule(8, 0, ConditionType::Contains, FieldName::Description, "c", 1),
            ],
            accept,
        );
        let ids: Vec<RuleId> = snapshot.rules().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![8, 3, 5]);
        assert_eq!(snapshot.revision(), 4);
        assert_eq!(snapshot.company(), 1);
    }

    struct BrokenRepository;

    impl RuleRepository for BrokenRepository {
        fn revision(&self, _company: CompanyId) -> Result<u64, EngineError> {
            Ok(0)
        }

        fn active_rules(&self, _company: CompanyId) -> Result<Vec<CategorizationRule>, EngineError> {
            Err(EngineError::IoError {
                message: "disk unavailable".to_string(),
            })
        }
    }

    #[test]
    fn test_unreadable_rule_set_is_reported_as_unavailable() {
        let err = RuleSnapshot::load(&BrokenRepository, 7).unwrap_err();
        assert_eq!(
            err,
            EngineError::rule_set_unavailable(7, "I/O error: disk unavailable")
        );
    }
}
