//! Per-company cache of compiled rule snapshots
//!
//! Compiling a snapshot orders the rules and builds every regex, so the async
//! categorizer keeps the latest one for each company. An entry is reused only
//! while the repository reports the same revision for that company.
//!
//! Snapshots are handed out as `Arc<RuleSnapshot>` and never mutated, so a run
//! keeps using its snapshot even if a newer one replaces it mid-run.

use crate::core::matcher::{unavailable, RuleSnapshot};
use crate::core::traits::RuleRepository;
use crate::types::{CompanyId, EngineError};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct RuleCache {
    snapshots: DashMap<CompanyId, Arc<RuleSnapshot>>,
}

impl RuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached snapshot for `company`, rebuilt when its revision changed
    ///
    /// # Errors
    ///
    /// [`EngineError::RuleSetUnavailable`] if the repository cannot be read.
    /// A stale entry is left in place in that case but never returned.
    pub fn get_or_load<R: RuleRepository + ?Sized>(
        &self,
        repository: &R,
        company: CompanyId,
    ) -> Result<Arc<RuleSnapshot>, EngineError> {
        let revision = repository
            .revision(company)
            .map_err(|e| unavailable(company, e))?;

        if let Some(cached) = self.snapshots.get(&company) {
            if cached.revision() == revision {
                tracing::debug!(company, revision, "Rule snapshot cache hit");
                return Ok(Arc::clone(cached.value()));
            }
        }

        let snapshot = Arc::new(RuleSnapshot::load(repository, company)?);
        tracing::debug!(
            company,
            revision = snapshot.revision(),
            rules = snapshot.rules().len(),
            "Rule snapshot rebuilt"
        );
        self.snapshots.insert(company, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop the cached snapshot of a company
    pub fn invalidate(&self, company: CompanyId) {
        self.snapshots.remove(&company);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category_table::CategoryTable;
    use crate::core::rule_store::RuleStore;
    use crate::types::{ConditionType, FieldName, NewCategory, RuleDraft, RulePatch};

    fn store() -> RuleStore {
        let mut categories = CategoryTable::new();
        let category = categories.create(NewCategory::new(Some(1), "Lazer")).unwrap();
        let mut store = RuleStore::new(categories);
        store
            .create_rule(RuleDraft::new(
                1,
                category,
                "Cinema",
                ConditionType::Contains,
                FieldName::Description,
                "cinema",
            ))
            .unwrap();
        store
    }

    #[test]
    fn test_unchanged_revision_reuses_snapshot() {
        let store = store();
        let cache = RuleCache::new();

        let first = cache.get_or_load(&store, 1).unwrap();
        let second = cache.get_or_load(&store, 1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_rule_edit_rebuilds_snapshot() {
        let mut store = store();
        let cache = RuleCache::new();

        let before = cache.get_or_load(&store, 1).unwrap();
        assert_eq!(before.rules().len(), 1);

        store
            .update_rule(
                1,
                RulePatch {
                    is_active: Some(false),
                    ..RulePatch::default()
                },
            )
            .unwrap();

        let after = cache.get_or_load(&store, 1).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.rules().is_empty());
        // The earlier snapshot is unaffected
        assert_eq!(before.rules().len(), 1);
    }

    #[test]
    fn test_companies_are_cached_separately() {
        let store = store();
        let cache = RuleCache::new();

        let one = cache.get_or_load(&store, 1).unwrap();
        let two = cache.get_or_load(&store, 2).unwrap();
        assert_eq!(one.rules().len(), 1);
        assert!(two.rules().is_empty());
        assert_eq!(cache.len(), 2);

        cache.invalidate(1);
        assert_eq!(cache.len(), 1);
    }
}
