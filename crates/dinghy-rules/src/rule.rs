//! Rule definitions
//!
//! A rule pairs an antecedent query (what triggers it) with an optional
//! consequent (the companion that must accompany every trigger). Without a
//! consequent every trigger is a violation.

use dinghy_core::{NodeId, Query, Result, RuleSeverity, Tree};
use serde::Serialize;
use std::fmt;

/// Mutation resolving a violation, applied to the live node
pub type RepairFn = fn(&mut Tree, NodeId) -> Result<()>;

/// How serious a violation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Configured severity; `off` disables the rule
    pub fn from_config(severity: RuleSeverity) -> Option<Self> {
        match severity {
            RuleSeverity::Off => None,
            RuleSeverity::Info => Some(Self::Info),
            RuleSeverity::Warn => Some(Self::Warning),
            RuleSeverity::Error => Some(Self::Error),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(text)
    }
}

/// Region searched for before/after companions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// Within the shell script of one instruction
    IntraDirective,
    /// Across the whole Dockerfile
    InterDirective,
}

impl Scope {
    /// Tag of the node that bounds the sibling walk
    pub fn root_tag(self) -> &'static str {
        match self {
            Scope::IntraDirective => "BASH-SCRIPT",
            Scope::InterDirective => "DOCKER-FILE",
        }
    }
}

/// Companion patterns; a trigger is fine as soon as one present part is met
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Consequent {
    /// Must occur inside the trigger
    pub in_node: Option<Query>,
    /// Must occur in the scope before the trigger
    pub before_node: Option<Query>,
    /// Must occur in the scope after the trigger
    pub after_node: Option<Query>,
}

impl Consequent {
    pub fn is_empty(&self) -> bool {
        self.in_node.is_none() && self.before_node.is_none() && self.after_node.is_none()
    }
}

/// A best-practice rule
#[derive(Clone)]
pub struct Rule {
    pub id: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub scope: Scope,
    pub query: Query,
    pub consequent: Consequent,
    pub repair: Option<RepairFn>,
}

impl Rule {
    /// Intra-directive warning rule without consequent or repair
    pub fn new(id: &'static str, description: &'static str, query: Query) -> Self {
        Self {
            id,
            description,
            severity: Severity::Warning,
            scope: Scope::IntraDirective,
            query,
            consequent: Consequent::default(),
            repair: None,
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn in_node(mut self, query: Query) -> Self {
        self.consequent.in_node = Some(query);
        self
    }

    pub fn before(mut self, query: Query) -> Self {
        self.consequent.before_node = Some(query);
        self
    }

    pub fn after(mut self, query: Query) -> Self {
        self.consequent.after_node = Some(query);
        self
    }

    pub fn repair(mut self, repair: RepairFn) -> Self {
        self.repair = Some(repair);
        self
    }

    pub fn is_repairable(&self) -> bool {
        self.repair.is_some()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("severity", &self.severity)
            .field("scope", &self.scope)
            .field("query", &self.query.to_string())
            .field("repairable", &self.is_repairable())
            .finish()
    }
}

/// Serializable summary used by listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    pub id: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub scope: Scope,
    pub repairable: bool,
}

impl From<&Rule> for RuleInfo {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id,
            description: rule.description,
            severity: rule.severity,
            scope: rule.scope,
            repairable: rule.is_repairable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinghy_core::q;

    #[test]
    fn test_builder_fills_consequent() {
        let rule = Rule::new("x", "demo", q("SC-APT-INSTALL"))
            .scope(Scope::InterDirective)
            .before(q("SC-APT-UPDATE"));
        assert_eq!(rule.scope.root_tag(), "DOCKER-FILE");
        assert!(!rule.consequent.is_empty());
        assert!(rule.consequent.in_node.is_none());
        assert!(!rule.is_repairable());
    }

    #[test]
    fn test_severity_from_config() {
        assert_eq!(Severity::from_config(RuleSeverity::Off), None);
        assert_eq!(Severity::from_config(RuleSeverity::Warn), Some(Severity::Warning));
        assert!(Severity::Error > Severity::Info);
    }
}
