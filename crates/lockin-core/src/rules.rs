//! Rule compiler: expanded allow-list to the single lockdown rule

use lockin_api::{
    BlockRule, ResourceType, RuleAction, RuleActionType, RuleCondition, LOCKDOWN_RULE_ID,
    LOCKDOWN_RULE_PRIORITY,
};

use crate::ExpandedAllowlist;

/// Compile the lockdown rule
///
/// Always blocks every top-level navigation. A non-empty allow-list becomes
/// the set of excluded initiator domains, emitted in sorted order; an empty
/// one leaves the exclusions absent so everything is blocked.
pub fn compile(expanded: &ExpandedAllowlist) -> BlockRule {
    let excluded_initiator_domains = if expanded.is_empty() {
        None
    } else {
        Some(expanded.iter().map(|d| d.as_str().to_string()).collect())
    };

    BlockRule {
        id: LOCKDOWN_RULE_ID,
        priority: LOCKDOWN_RULE_PRIORITY,
        action: RuleAction {
            kind: RuleActionType::Block,
        },
        condition: RuleCondition {
            url_filter: "*".into(),
            excluded_initiator_domains,
            resource_types: vec![ResourceType::MainFrame],
        },
    }
}
