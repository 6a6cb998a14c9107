//! Category types
//!
//! Categories live in a flat table keyed by id (see
//! [`crate::core::CategoryTable`]). A category refers to its parent by id, never
//! by an owning pointer.

use super::transaction::CompanyId;

/// Category identifier
pub type CategoryId = u32;

/// Default display color for new categories
pub const DEFAULT_COLOR: &str = "#9E9E9E";

/// A transaction category
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,

    /// Owning company, or `None` for a system-wide category
    pub company: Option<CompanyId>,

    /// Parent category id (non-owning)
    pub parent: Option<CategoryId>,

    pub name: String,

    /// Hex display color
    pub color: String,

    /// System categories are read-only to tenants
    pub is_system: bool,

    pub is_active: bool,
}

impl Category {
    /// Whether this category is shared by every company
    pub fn is_system_wide(&self) -> bool {
        self.company.is_none()
    }

    /// Whether rules and transactions of `company` may reference this category
    pub fn is_visible_to(&self, company: CompanyId) -> bool {
        self.company.map_or(true, |owner| owner == company)
    }
}

/// Input for creating a category with a table-assigned id
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub company: Option<CompanyId>,
    pub parent: Option<CategoryId>,
    pub name: String,
    pub color: Option<String>,
    pub is_system: bool,
}

impl NewCategory {
    pub fn new(company: Option<CompanyId>, name: impl Into<String>) -> Self {
        NewCategory {
            company,
            parent: None,
            name: name.into(),
            color: None,
            is_system: false,
        }
    }

    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }
}
