//! Rule validation and dry-run testing
//!
//! Both operations are pure: they read a draft and caller-supplied values and
//! never touch storage.

use crate::core::category_table::CategoryTable;
use crate::core::condition::Condition;
use crate::types::{
    CategoryId, CompanyId, RuleDraft, TransactionFields, ValidationError,
};

/// Statically validate a rule before it is persisted
///
/// Checks that the name is not blank, that numeric condition types target
/// `amount` with a decimal literal, and that REGEX patterns compile.
pub fn validate(draft: &RuleDraft) -> Result<(), ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Condition::compile(draft.condition_type, draft.field_name, &draft.field_value)?;
    Ok(())
}

/// Evaluate a draft against synthetic field values
///
/// Used to preview a rule's effect before saving it.
///
/// # Errors
///
/// The draft's condition fails validation.
pub fn test_draft(draft: &RuleDraft, fields: &TransactionFields) -> Result<bool, ValidationError> {
    let condition =
        Condition::compile(draft.condition_type, draft.field_name, &draft.field_value)?;
    Ok(condition.evaluate(fields))
}

/// A rule of `company` may only target its own or system-wide categories
pub fn check_category_scope(
    categories: &CategoryTable,
    company: CompanyId,
    category: CategoryId,
) -> Result<(), ValidationError> {
    let target = categories
        .get(category)
        .ok_or(ValidationError::UnknownCategory { category })?;

    if target.is_visible_to(company) {
        Ok(())
    } else {
        Err(ValidationError::CategoryOutOfScope { category, company })
    }
}
