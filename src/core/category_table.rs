//! Flat category table
//!
//! Categories are stored in a `Vec` and located through an id index. Parent
//! links are ids into the same table, so the hierarchy never forms ownership
//! cycles. Reference cycles are rejected on every write that touches a parent
//! link.
//!
//! `full_path` is derived from the current ancestor chain on every read, so
//! renames and reparenting are reflected immediately for all descendants.

use crate::types::category::DEFAULT_COLOR;
use crate::types::{Category, CategoryError, CategoryId, CompanyId, NewCategory};
use std::collections::HashMap;

/// Separator between ancestor names in a full path
pub const PATH_SEPARATOR: &str = " > ";

/// Categories seeded for every company by [`CategoryTable::create_defaults`]
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Receitas", "#4CAF50"),
    ("Despesas", "#F44336"),
    ("Transferências", "#2196F3"),
];

/// Arena of categories keyed by id
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    categories: Vec<Category>,
    index: HashMap<CategoryId, usize>,
    next_id: u64,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category with a caller-chosen id
    ///
    /// Used when loading persisted categories. A parent must be inserted
    /// before its children.
    ///
    /// # Errors
    ///
    /// - [`CategoryError::DuplicateId`] if the id is taken
    /// - [`CategoryError::NotFound`] if the parent does not exist
    /// - [`CategoryError::ParentOutOfScope`] if the parent belongs to another
    ///   company
    /// - [`CategoryError::DuplicateName`] if the name is taken in the same scope
    pub fn insert(&mut self, category: Category) -> Result<CategoryId, CategoryError> {
        if self.index.contains_key(&category.id) {
            return Err(CategoryError::DuplicateId {
                category: category.id,
            });
        }
        if let Some(parent) = category.parent {
            self.check_parent_scope(category.id, category.company, parent)?;
        }
        self.check_unique_name(category.company, &category.name, None)?;

        let id = category.id;
        self.index.insert(id, self.categories.len());
        self.categories.push(category);
        self.next_id = self.next_id.max(u64::from(id) + 1);
        Ok(id)
    }

    /// Create a category under a fresh id
    ///
    /// Fails with [`CategoryError::IdsExhausted`] once `CategoryId::MAX` is
    /// in use.
    pub fn create(&mut self, new: NewCategory) -> Result<CategoryId, CategoryError> {
        let id = CategoryId::try_from(self.next_id.max(1))
            .map_err(|_| CategoryError::IdsExhausted)?;
        self.insert(Category {
            id,
            company: new.company,
            parent: new.parent,
            name: new.name,
            color: new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            is_system: new.is_system,
            is_active: true,
        })
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.index.get(&id).map(|&slot| &self.categories[slot])
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Rename a tenant category
    pub fn rename(&mut self, id: CategoryId, name: impl Into<String>) -> Result<(), CategoryError> {
        let name = name.into();
        let company = self.editable(id)?.company;
        self.check_unique_name(company, &name, Some(id))?;
        self.slot_mut(id)?.name = name;
        Ok(())
    }

    /// Move a tenant category under a new parent, or to the root
    ///
    /// # Errors
    ///
    /// [`CategoryError::CycleDetected`] if `parent` is the category itself or
    /// one of its descendants.
    pub fn set_parent(
        &mut self,
        id: CategoryId,
        parent: Option<CategoryId>,
    ) -> Result<(), CategoryError> {
        let company = self.editable(id)?.company;
        if let Some(parent) = parent {
            self.check_parent_scope(id, company, parent)?;
            if parent == id || self.ancestors(parent).contains(&id) {
                return Err(CategoryError::CycleDetected {
                    category: id,
                    parent,
                });
            }
        }
        self.slot_mut(id)?.parent = parent;
        Ok(())
    }

    pub fn set_active(&mut self, id: CategoryId, is_active: bool) -> Result<(), CategoryError> {
        self.editable(id)?;
        self.slot_mut(id)?.is_active = is_active;
        Ok(())
    }

    /// Ancestor ids from the direct parent up to the root
    pub fn ancestors(&self, id: CategoryId) -> Vec<CategoryId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|c| c.parent);
        while let Some(parent) = current {
            // Loaded data is trusted to be acyclic, but never loop forever on it
            if chain.contains(&parent) || chain.len() > self.categories.len() {
                break;
            }
            chain.push(parent);
            current = self.get(parent).and_then(|c| c.parent);
        }
        chain
    }

    /// Ancestor names joined root-first, ending with the category's own name
    pub fn full_path(&self, id: CategoryId) -> Option<String> {
        let category = self.get(id)?;
        let mut names: Vec<&str> = self
            .ancestors(id)
            .iter()
            .rev()
            .filter_map(|&a| self.get(a).map(|c| c.name.as_str()))
            .collect();
        names.push(category.name.as_str());
        Some(names.join(PATH_SEPARATOR))
    }

    /// Active direct children, by name
    pub fn children(&self, id: CategoryId) -> Vec<&Category> {
        let mut children: Vec<&Category> = self
            .categories
            .iter()
            .filter(|c| c.parent == Some(id) && c.is_active)
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        children
    }

    /// Active categories usable by a company, including system-wide ones, by name
    pub fn list(&self, company: CompanyId) -> Vec<&Category> {
        let mut visible: Vec<&Category> = self
            .categories
            .iter()
            .filter(|c| c.is_active && c.is_visible_to(company))
            .collect();
        visible.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        visible
    }

    /// Seed the default system categories for a company
    ///
    /// Categories whose name already exists for the company are left alone,
    /// so calling this twice creates nothing the second time.
    pub fn create_defaults(&mut self, company: CompanyId) -> Result<Vec<CategoryId>, CategoryError> {
        let mut created = Vec::new();
        for (name, color) in DEFAULT_CATEGORIES {
            if self.find_by_name(Some(company), name).is_some() {
                continue;
            }
            let id = self.create(
                NewCategory::new(Some(company), *name)
                    .with_color(*color)
                    .system(),
            )?;
            created.push(id);
        }
        Ok(created)
    }

    pub fn find_by_name(&self, company: Option<CompanyId>, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.company == company && c.name == name)
    }

    fn editable(&self, id: CategoryId) -> Result<&Category, CategoryError> {
        let category = self
            .get(id)
            .ok_or(CategoryError::NotFound { category: id })?;
        if category.is_system {
            return Err(CategoryError::SystemCategoryReadOnly { category: id });
        }
        Ok(category)
    }

    fn slot_mut(&mut self, id: CategoryId) -> Result<&mut Category, CategoryError> {
        let slot = *self
            .index
            .get(&id)
            .ok_or(CategoryError::NotFound { category: id })?;
        Ok(&mut self.categories[slot])
    }

    fn check_parent_scope(
        &self,
        id: CategoryId,
        company: Option<CompanyId>,
        parent: CategoryId,
    ) -> Result<(), CategoryError> {
        let parent_category = self
            .get(parent)
            .ok_or(CategoryError::NotFound { category: parent })?;
        let in_scope = match company {
            Some(company) => parent_category.is_visible_to(company),
            None => parent_category.is_system_wide(),
        };
        if in_scope {
            Ok(())
        } else {
            Err(CategoryError::ParentOutOfScope {
                category: id,
                parent,
            })
        }
    }

    fn check_unique_name(
        &self,
        company: Option<CompanyId>,
        name: &str,
        except: Option<CategoryId>,
    ) -> Result<(), CategoryError> {
        match self.find_by_name(company, name) {
            Some(existing) if Some(existing.id) != except => Err(CategoryError::DuplicateName {
                name: name.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (CategoryTable, CategoryId, CategoryId, CategoryId) {
        let mut table = CategoryTable::new();
        let despesas = table.create(NewCategory::new(Some(1), "Despesas")).unwrap();
        let moradia = table
            .create(NewCategory::new(Some(1), "Moradia").with_parent(despesas))
            .unwrap();
        let aluguel = table
            .create(NewCategory::new(Some(1), "Aluguel").with_parent(moradia))
            .unwrap();
        (table, despesas, moradia, aluguel)
    }

    #[test]
    fn test_full_path_follows_ancestors() {
        let (table, despesas, _, aluguel) = table();
        assert_eq!(table.full_path(despesas).as_deref(), Some("Despesas"));
        assert_eq!(
            table.full_path(aluguel).as_deref(),
            Some("Despesas > Moradia > Aluguel")
        );
        assert_eq!(table.full_path(999), None);
    }

    #[test]
    fn test_full_path_tracks_rename_and_reparent() {
        let (mut table, despesas, moradia, aluguel) = table();
        table.rename(moradia, "Casa").unwrap();
        assert_eq!(
            table.full_path(aluguel).as_deref(),
            Some("Despesas > Casa > Aluguel")
        );

        table.set_parent(aluguel, Some(despesas)).unwrap();
        assert_eq!(table.full_path(aluguel).as_deref(), Some("Despesas > Aluguel"));

        table.set_parent(aluguel, None).unwrap();
        assert_eq!(table.full_path(aluguel).as_deref(), Some("Aluguel"));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let (mut table, despesas, _, aluguel) = table();
        assert_eq!(
            table.set_parent(despesas, Some(aluguel)),
            Err(CategoryError::CycleDetected {
                category: despesas,
                parent: aluguel
            })
        );
        assert_eq!(
            table.set_parent(despesas, Some(despesas)),
            Err(CategoryError::CycleDetected {
                category: despesas,
                parent: despesas
            })
        );
        assert_eq!(table.get(despesas).unwrap().parent, None);
    }

    #[test]
    fn test_parent_must_share_company() {
        let (mut table, despesas, _, _) = table();
        let other = table.create(NewCategory::new(Some(2), "Outros")).unwrap();
        assert_eq!(
            table.set_parent(other, Some(despesas)),
            Err(CategoryError::ParentOutOfScope {
                category: other,
                parent: despesas
            })
        );

        let system = table
            .create(NewCategory::new(None, "Impostos").system())
            .unwrap();
        assert!(table.set_parent(other, Some(system)).is_ok());
    }

    #[test]
    fn test_system_categories_are_read_only() {
        let mut table = CategoryTable::new();
        let system = table
            .create(NewCategory::new(None, "Transferências").system())
            .unwrap();

        let expected = Err(CategoryError::SystemCategoryReadOnly { category: system });
        assert_eq!(table.rename(system, "X"), expected);
        assert_eq!(table.set_active(system, false), expected);
        assert_eq!(table.set_parent(system, None), expected);
    }

    #[test]
    fn test_names_are_unique_per_company() {
        let (mut table, _, _, _) = table();
        assert_eq!(
            table.create(NewCategory::new(Some(1), "Despesas")),
            Err(CategoryError::DuplicateName {
                name: "Despesas".to_string()
            })
        );
        assert!(table.create(NewCategory::new(Some(2), "Despesas")).is_ok());
    }

    #[test]
    fn test_insert_requires_existing_parent() {
        let mut table = CategoryTable::new();
        let orphan = Category {
            id: 5,
            company: Some(1),
            parent: Some(4),
            name: "Orphan".to_string(),
            color: DEFAULT_COLOR.to_string(),
            is_system: false,
            is_active: true,
        };
        assert_eq!(
            table.insert(orphan),
            Err(CategoryError::NotFound { category: 4 })
        );
    }

    #[test]
    fn test_create_after_insert_uses_fresh_id() {
        let mut table = CategoryTable::new();
        table
            .insert(Category {
                id: 40,
                company: None,
                parent: None,
                name: "Sistema".to_string(),
                color: DEFAULT_COLOR.to_string(),
                is_system: true,
                is_active: true,
            })
            .unwrap();
        let id = table.create(NewCategory::new(Some(1), "Nova")).unwrap();
        assert_eq!(id, 41);
        assert_eq!(
            table.insert(Category {
                id: 40,
                company: None,
                parent: None,
                name: "Outra".to_string(),
                color: DEFAULT_COLOR.to_string(),
                is_system: false,
                is_active: true,
            }),
            Err(CategoryError::DuplicateId { category: 40 })
        );
    }

    #[test]
    fn test_create_fails_once_max_id_is_taken() {
        let mut table = CategoryTable::new();
        table
            .insert(Category {
                id: CategoryId::MAX,
                company: None,
                parent: None,
                name: "Última".to_string(),
                color: DEFAULT_COLOR.to_string(),
                is_system: true,
                is_active: true,
            })
            .unwrap();

        assert_eq!(
            table.create(NewCategory::new(Some(1), "Nova")),
            Err(CategoryError::IdsExhausted)
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_list_and_children() {
        let (mut table, despesas, moradia, _) = table();
        let luz = table
            .create(NewCategory::new(Some(1), "Energia").with_parent(despesas))
            .unwrap();
        table.create(NewCategory::new(Some(2), "Alheia")).unwrap();
        table.create(NewCategory::new(None, "Global").system()).unwrap();
        table.set_active(luz, false).unwrap();

        let children: Vec<CategoryId> = table.children(despesas).iter().map(|c| c.id).collect();
        assert_eq!(children, vec![moradia]);

        let names: Vec<&str> = table.list(1).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Aluguel", "Despesas", "Global", "Moradia"]);
    }

    #[test]
    fn test_create_defaults_is_idempotent() {
        let mut table = CategoryTable::new();
        let created = table.create_defaults(1).unwrap();
        assert_eq!(created.len(), DEFAULT_CATEGORIES.len());
        assert!(created.iter().all(|&id| table.get(id).unwrap().is_system));

        assert!(table.create_defaults(1).unwrap().is_empty());
        assert_eq!(table.create_defaults(2).unwrap().len(), DEFAULT_CATEGORIES.len());
        assert_eq!(table.len(), DEFAULT_CATEGORIES.len() * 2);
    }
}
