//! Network-blocking rule objects accepted by the rule sink
//!
//! The shape mirrors a declarative request-filtering engine: one rule,
//! identified by a fixed id, blocking top-level navigation except from an
//! optional set of initiator domains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a rule inside the rule sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u32);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single lockdown rule always uses this id
pub const LOCKDOWN_RULE_ID: RuleId = RuleId(1);

/// Priority of the lockdown rule
pub const LOCKDOWN_RULE_PRIORITY: u32 = 1;

/// What a matching request is subjected to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleActionType {
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: RuleActionType,
}

/// Request categories a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Top-level navigation
    MainFrame,
}

/// Match condition of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,

    /// Requests initiated from these domains are not blocked.
    /// Sorted; absent when nothing is exempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_initiator_domains: Option<Vec<String>>,

    pub resource_types: Vec<ResourceType>,
}

/// A complete rule as installed into the rule sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRule {
    pub id: RuleId,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

impl BlockRule {
    /// Whether this rule blocks top-level navigation
    pub fn blocks_navigation(&self) -> bool {
        self.action.kind == RuleActionType::Block
            && self.condition.resource_types.contains(&ResourceType::MainFrame)
    }

    /// Exempt initiator domains (empty when everything is blocked)
    pub fn exclusions(&self) -> &[String] {
        self.condition
            .excluded_initiator_domains
            .as_deref()
            .unwrap_or(&[])
    }

    /// Whether a navigation initiated from `host` passes this rule
    pub fn allows_initiator(&self, host: &str) -> bool {
        self.exclusions().iter().any(|d| d == host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(exclusions: Option<Vec<String>>) -> BlockRule {
        BlockRule {
            id: LOCKDOWN_RULE_ID,
            priority: LOCKDOWN_RULE_PRIORITY,
            action: RuleAction {
                kind: RuleActionType::Block,
            },
            condition: RuleCondition {
                url_filter: "*".into(),
                excluded_initiator_domains: exclusions,
                resource_types: vec![ResourceType::MainFrame],
            },
        }
    }

    #[test]
    fn wire_shape_matches_filter_engine() {
        let json = serde_json::to_value(rule(Some(vec!["github.com".into()]))).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["action"]["type"], "block");
        assert_eq!(json["condition"]["urlFilter"], "*");
        assert_eq!(json["condition"]["resourceTypes"][0], "main_frame");
        assert_eq!(json["condition"]["excludedInitiatorDomains"][0], "github.com");
    }

    #[test]
    fn block_all_rule_omits_exclusions() {
        let json = serde_json::to_value(rule(None)).unwrap();
        assert!(json["condition"].get("excludedInitiatorDomains").is_none());
    }

    #[test]
    fn initiator_checks() {
        let r = rule(Some(vec!["github.com".into()]));
        assert!(r.blocks_navigation());
        assert!(r.allows_initiator("github.com"));
        assert!(!r.allows_initiator("reddit.com"));
        assert!(!rule(None).allows_initiator("github.com"));
    }
}
