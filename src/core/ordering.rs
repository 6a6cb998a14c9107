//! Rule ordering
//!
//! Rules are evaluated by ascending `priority`, ties broken by ascending rule
//! id. The order depends only on `(priority, id)`, never on storage iteration
//! order, so an unchanged rule set always categorizes the same way.

use crate::types::{CategorizationRule, RuleId};

/// Sort key of a rule in evaluation order
pub fn sort_key(rule: &CategorizationRule) -> (i32, RuleId) {
    (rule.priority, rule.id)
}

/// Keep the active rules and put them in evaluation order
pub fn order_rules<I>(rules: I) -> Vec<CategorizationRule>
where
    I: IntoIterator<Item = CategorizationRule>,
{
    let mut ordered: Vec<CategorizationRule> =
        rules.into_iter().filter(|rule| rule.is_active).collect();
    ordered.sort_by_key(sort_key);
    ordered
}
