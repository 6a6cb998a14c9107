//! In-memory rule store
//!
//! Backs the rule boundary operations: listing, creating, updating, deleting
//! and dry-run testing rules. Every write is validated before it is stored,
//! and bumps the owning company's revision so cached snapshots are rebuilt.
//!
//! Rules loaded through [`RuleStore::load_rules`] bypass validation. They are
//! checked again when a batch run compiles its snapshot.

use crate::core::category_table::CategoryTable;
use crate::core::condition::Condition;
use crate::core::ordering::sort_key;
use crate::core::traits::RuleRepository;
use crate::core::validator::{check_category_scope, test_draft, validate};
use crate::types::{
    CategorizationRule, CompanyId, EngineError, RuleDraft, RuleFilter, RuleId, RulePatch,
    TransactionFields, ValidationError,
};
use std::collections::{BTreeMap, HashMap};

/// Rule to evaluate in [`RuleStore::test_rule`]
#[derive(Debug, Clone, Copy)]
pub enum RuleTarget<'a> {
    /// A persisted rule
    Saved(RuleId),

    /// An unsaved candidate
    Draft(&'a RuleDraft),
}

/// Rules of every company, plus the category table they reference
#[derive(Debug, Clone)]
pub struct RuleStore {
    categories: CategoryTable,
    rules: BTreeMap<RuleId, CategorizationRule>,
    revisions: HashMap<CompanyId, u64>,

    /// Bumped on every category table borrow for writing
    category_generation: u64,

    /// Wider than [`RuleId`] so a stored `RuleId::MAX` leaves it past the end
    next_id: u64,
}

impl RuleStore {
    /// Create an empty rule store over a category table
    pub fn new(categories: CategoryTable) -> Self {
        RuleStore {
            categories,
            rules: BTreeMap::new(),
            revisions: HashMap::new(),
            category_generation: 0,
            next_id: 1,
        }
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// Mutable access to the category table
    ///
    /// Category edits can change which rules pass the scope check, so this
    /// invalidates the snapshots of every company.
    pub fn categories_mut(&mut self) -> &mut CategoryTable {
        self.category_generation += 1;
        &mut self.categories
    }

    /// A company's rules that pass `filter`, in evaluation order
    ///
    /// Inactive rules are included unless the filter excludes them.
    pub fn list_rules(&self, company: CompanyId, filter: &RuleFilter) -> Vec<&CategorizationRule> {
        let mut rules: Vec<&CategorizationRule> = self
            .rules
            .values()
            .filter(|rule| rule.company == company && filter.matches(rule))
            .collect();
        rules.sort_by_key(|rule| sort_key(rule));
        rules
    }

    pub fn get_rule(&self, id: RuleId) -> Option<&CategorizationRule> {
        self.rules.get(&id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate and persist a new rule
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyName`], `InvalidPattern`,
    ///   `InvalidFieldCombination` or `InvalidNumericLiteral` from the condition
    /// - [`ValidationError::UnknownCategory`] or `CategoryOutOfScope` for the
    ///   target category
    /// - [`ValidationError::DuplicateName`] if the company already has a rule
    ///   with that name
    /// - [`EngineError::RuleIdsExhausted`] once `RuleId::MAX` has been used
    pub fn create_rule(&mut self, draft: RuleDraft) -> Result<CategorizationRule, EngineError> {
        self.check_draft(&draft, None)?;

        let id = RuleId::try_from(self.next_id).map_err(|_| EngineError::RuleIdsExhausted)?;
        self.next_id += 1;
        let rule = draft.into_rule(id);
        self.bump(rule.company);
        self.rules.insert(id, rule.clone());

        tracing::debug!(rule_id = id, company = rule.company, "Created rule");
        Ok(rule)
    }

    /// Apply a partial update to a saved rule
    ///
    /// The patched rule goes through the same checks as a new one. On error
    /// the stored rule is unchanged.
    pub fn update_rule(
        &mut self,
        id: RuleId,
        patch: RulePatch,
    ) -> Result<CategorizationRule, EngineError> {
        let current = self.rules.get(&id).ok_or(EngineError::rule_not_found(id))?;
        let updated = current.patched(&patch);
        self.check_draft(&updated.to_draft(), Some(id))?;

        self.bump(updated.company);
        self.rules.insert(id, updated.clone());

        tracing::debug!(rule_id = id, company = updated.company, "Updated rule");
        Ok(updated)
    }

    pub fn delete_rule(&mut self, id: RuleId) -> Result<(), EngineError> {
        let removed = self.rules.remove(&id).ok_or(EngineError::rule_not_found(id))?;
        self.bump(removed.company);
        tracing::debug!(rule_id = id, company = removed.company, "Deleted rule");
        Ok(())
    }

    /// Evaluate a saved rule or a draft against synthetic field values
    ///
    /// Never writes to the store.
    pub fn test_rule(
        &self,
        target: RuleTarget<'_>,
        fields: &TransactionFields,
    ) -> Result<bool, EngineError> {
        match target {
            RuleTarget::Draft(draft) => Ok(test_draft(draft, fields)?),
            RuleTarget::Saved(id) => {
                let rule = self.rules.get(&id).ok_or(EngineError::rule_not_found(id))?;
                let condition =
                    Condition::compile(rule.condition_type, rule.field_name, &rule.field_value)?;
                Ok(condition.evaluate(fields))
            }
        }
    }

    /// Insert persisted rules as-is, keeping their ids
    ///
    /// A later row with an id already present replaces the earlier one.
    pub fn load_rules<I>(&mut self, rules: I)
    where
        I: IntoIterator<Item = CategorizationRule>,
    {
        for rule in rules {
            self.next_id = self.next_id.max(u64::from(rule.id) + 1);
            self.bump(rule.company);
            self.rules.insert(rule.id, rule);
        }
    }

    /// Current revision of a company's rule set
    pub fn revision(&self, company: CompanyId) -> u64 {
        self.revisions.get(&company).copied().unwrap_or(0) + self.category_generation
    }

    fn bump(&mut self, company: CompanyId) {
        *self.revisions.entry(company).or_default() += 1;
    }

    fn check_draft(&self, draft: &RuleDraft, except: Option<RuleId>) -> Result<(), ValidationError> {
        validate(draft)?;
        check_category_scope(&self.categories, draft.company, draft.category)?;

        let name = draft.name.trim();
        let taken = self.rules.values().any(|rule| {
            rule.company == draft.company
                && Some(rule.id) != except
                && rule.name.trim().eq_ignore_ascii_case(name)
        });
        if taken {
            return Err(ValidationError::DuplicateName {
                name: name.to_string(),
                company: draft.company,
            });
        }
        Ok(())
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(CategoryTable::new())
    }
}

impl RuleRepository for RuleStore {
    fn revision(&self, company: CompanyId) -> Result<u64, EngineError> {
        Ok(RuleStore::revision(self, company))
    }

    fn active_rules(&self, company: CompanyId) -> Result<Vec<CategorizationRule>, EngineError> {
        Ok(self
            .rules
            .values()
            .filter(|rule| rule.company == company && rule.is_active)
            .cloned()
            .collect())
    }

    fn check_category(&self, rule: &CategorizationRule) -> Result<(), ValidationError> {
        check_category_scope(&self.categories, rule.company, rule.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CategoryId, ConditionType, FieldName, NewCategory, TransactionType, ValidationErrorKind,
    };
    use rust_decimal::Decimal;

    struct Fixture {
        store: RuleStore,
        receitas: CategoryId,
        mercado: CategoryId,
        foreign: CategoryId,
    }

    fn fixture() -> Fixture {
        let mut categories = CategoryTable::new();
        let receitas = categories
            .create(NewCategory::new(None, "Receitas").system())
            .unwrap();
        let mercado = categories.create(NewCategory::new(Some(1), "Mercado")).unwrap();
        let foreign = categories.create(NewCategory::new(Some(2), "Mercado")).unwrap();
        Fixture {
            store: RuleStore::new(categories),
            receitas,
            mercado,
            foreign,
        }
    }

    fn contains(category: CategoryId, name: &str, needle: &str) -> RuleDraft {
        RuleDraft::new(
            1,
            category,
            name,
            ConditionType::Contains,
            FieldName::Description,
            needle,
        )
    }

    #[test]
    fn test_create_applies_defaults() {
        let mut f = fixture();
        let rule = f
            .store
            .create_rule(contains(f.mercado, "Mercado", "mercado"))
            .unwrap();
        assert_eq!(rule.id, 1);
        assert_eq!(rule.priority, 1);
        assert!(rule.is_active);
        assert_eq!(f.store.get_rule(1), Some(&rule));
    }

    #[test]
    fn test_create_rejects_invalid_regex() {
        let mut f = fixture();
        let draft = RuleDraft::new(
            1,
            f.mercado,
            "Broken",
            ConditionType::Regex,
            FieldName::Description,
            "(abc",
        );
        let err = f.store.create_rule(draft).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ref e) if e.kind() == ValidationErrorKind::InvalidPattern
        ));
        assert!(f.store.is_empty());
        assert_eq!(f.store.revision(1), 0);
    }

    #[test]
    fn test_create_rejects_foreign_category() {
        let mut f = fixture();
        let err = f
            .store
            .create_rule(contains(f.foreign, "Other", "x"))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::CategoryOutOfScope {
                category: f.foreign,
                company: 1
            })
        );
        assert!(f.store.create_rule(contains(f.receitas, "System", "x")).is_ok());
    }

    #[test]
    fn test_rule_names_are_unique_per_company() {
        let mut f = fixture();
        f.store.create_rule(contains(f.mercado, "Mercado", "a")).unwrap();
        let err = f
            .store
            .create_rule(contains(f.mercado, "mercado", "b"))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::DuplicateName { .. })
        ));

        let mut other_company = contains(f.foreign, "Mercado", "a");
        other_company.company = 2;
        assert!(f.store.create_rule(other_company).is_ok());
    }

    #[test]
    fn test_update_validates_patched_rule() {
        let mut f = fixture();
        let rule = f.store.create_rule(contains(f.mercado, "Big", "x")).unwrap();

        let bad = RulePatch {
            condition_type: Some(ConditionType::GreaterThan),
            ..RulePatch::default()
        };
        let err = f.store.update_rule(rule.id, bad).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::InvalidFieldCombination { .. })
        ));
        assert_eq!(f.store.get_rule(rule.id), Some(&rule));

        let good = RulePatch {
            condition_type: Some(ConditionType::GreaterThan),
            field_name: Some(FieldName::Amount),
            field_value: Some("1000".to_string()),
            priority: Some(5),
            ..RulePatch::default()
        };
        let updated = f.store.update_rule(rule.id, good).unwrap();
        assert_eq!(updated.priority, 5);
        assert_eq!(updated.name, "Big");
    }

    #[test]
    fn test_update_keeps_own_name() {
        let mut f = fixture();
        let rule = f.store.create_rule(contains(f.mercado, "Mercado", "x")).unwrap();
        let patch = RulePatch {
            name: Some("Mercado".to_string()),
            ..RulePatch::default()
        };
        assert!(f.store.update_rule(rule.id, patch).is_ok());
    }

    #[test]
    fn test_update_and_delete_missing_rule() {
        let mut f = fixture();
        assert_eq!(
            f.store.update_rule(42, RulePatch::default()),
            Err(EngineError::RuleNotFound { rule: 42 })
        );
        assert_eq!(
            f.store.delete_rule(42),
            Err(EngineError::RuleNotFound { rule: 42 })
        );
    }

    #[test]
    fn test_every_mutation_bumps_revision() {
        let mut f = fixture();
        let rule = f.store.create_rule(contains(f.mercado, "A", "a")).unwrap();
        assert_eq!(f.store.revision(1), 1);

        f.store
            .update_rule(
                rule.id,
                RulePatch {
                    is_active: Some(false),
                    ..RulePatch::default()
                },
            )
            .unwrap();
        assert_eq!(f.store.revision(1), 2);

        f.store.delete_rule(rule.id).unwrap();
        assert_eq!(f.store.revision(1), 3);
        assert_eq!(f.store.revision(2), 0);

        f.store.categories_mut();
        assert_eq!(f.store.revision(1), 4);
        assert_eq!(f.store.revision(2), 1);
    }

    #[test]
    fn test_list_rules_filters_and_orders() {
        let mut f = fixture();
        f.store
            .create_rule(contains(f.mercado, "Padaria", "pao").with_priority(3))
            .unwrap();
        f.store
            .create_rule(contains(f.receitas, "Salario", "salario").with_priority(1))
            .unwrap();
        f.store
            .create_rule(
                contains(f.mercado, "Feira", "hortifruti")
                    .with_priority(3)
                    .with_active(false),
            )
            .unwrap();

        let all: Vec<&str> = f
            .store
            .list_rules(1, &RuleFilter::default())
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(all, vec!["Salario", "Padaria", "Feira"]);

        let active_mercado = RuleFilter {
            category: Some(f.mercado),
            is_active: Some(true),
            ..RuleFilter::default()
        };
        let names: Vec<&str> = f
            .store
            .list_rules(1, &active_mercado)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["Padaria"]);

        let search = RuleFilter {
            search: Some("HORTI".to_string()),
            ..RuleFilter::default()
        };
        assert_eq!(f.store.list_rules(1, &search).len(), 1);
        assert!(f.store.list_rules(2, &RuleFilter::default()).is_empty());
    }

    #[test]
    fn test_dry_run_on_saved_rule_and_draft() {
        let mut f = fixture();
        let rule = f
            .store
            .create_rule(RuleDraft::new(
                1,
                f.receitas,
                "Credits",
                ConditionType::Equals,
                FieldName::TransactionType,
                "credit",
            ))
            .unwrap();
        let revision = f.store.revision(1);

        let salary = TransactionFields::default()
            .with_description("Salário")
            .with_amount(Decimal::new(500000, 2))
            .with_transaction_type(TransactionType::Credit);
        assert_eq!(f.store.test_rule(RuleTarget::Saved(rule.id), &salary), Ok(true));

        let draft = contains(f.mercado, "Unsaved", "aluguel");
        assert_eq!(f.store.test_rule(RuleTarget::Draft(&draft), &salary), Ok(false));

        assert_eq!(
            f.store.test_rule(RuleTarget::Saved(99), &salary),
            Err(EngineError::RuleNotFound { rule: 99 })
        );
        assert_eq!(f.store.revision(1), revision);
        assert_eq!(f.store.len(), 1);
    }

    #[test]
    fn test_loaded_rules_are_validated_at_snapshot_time() {
        let mut f = fixture();
        f.store.load_rules(vec![
            contains(f.mercado, "Valid", "mercado").into_rule(10),
            RuleDraft::new(1, f.mercado, "Bad", ConditionType::Regex, FieldName::Description, "[")
                .into_rule(11),
            contains(f.foreign, "Foreign", "x").into_rule(12),
        ]);
        assert_eq!(f.store.len(), 3);

        let active = f.store.active_rules(1).unwrap();
        assert_eq!(active.len(), 3);
        assert!(f.store.check_category(&active[2]).is_err());

        let created = f.store.create_rule(contains(f.mercado, "Next", "y")).unwrap();
        assert_eq!(created.id, 13);
    }

    #[test]
    fn test_rule_ids_run_out_after_max_id_is_loaded() {
        let mut f = fixture();
        f.store
            .load_rules(vec![contains(f.mercado, "Last", "x").into_rule(RuleId::MAX)]);

        let err = f
            .store
            .create_rule(contains(f.mercado, "Overflow", "y"))
            .unwrap_err();
        assert_eq!(err, EngineError::RuleIdsExhausted);
        assert_eq!(f.store.len(), 1);
        assert_eq!(f.store.get_rule(RuleId::MAX).map(|r| r.name.as_str()), Some("Last"));
    }

    #[test]
    fn test_dry_run_reads_category_like_a_batch_run() {
        let mut f = fixture();
        let rule = f
            .store
            .create_rule(RuleDraft::new(
                1,
                f.receitas,
                "Recategorize",
                ConditionType::Equals,
                FieldName::Category,
                f.mercado.to_string(),
            ))
            .unwrap();

        let mut tx = crate::types::Transaction::new(
            1,
            1,
            "Mercado",
            Decimal::new(-1000, 2),
            TransactionType::Debit,
        );
        tx.category = Some(f.mercado);
        let condition =
            Condition::compile(rule.condition_type, rule.field_name, &rule.field_value).unwrap();
        assert!(condition.evaluate(&tx));

        let fields = TransactionFields::default().with_category(f.mercado);
        assert_eq!(f.store.test_rule(RuleTarget::Saved(rule.id), &fields), Ok(true));

        let other = TransactionFields::default().with_category(f.foreign);
        assert_eq!(f.store.test_rule(RuleTarget::Saved(rule.id), &other), Ok(false));
    }
}
