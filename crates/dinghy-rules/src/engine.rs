//! Rule matching, violations and batch repair

use crate::builtin;
use crate::rule::{Rule, RuleInfo, Scope, Severity};
use dinghy_core::{DinghyConfig, DinghyError, Dockerfile, NodeId, Position, Query, Result, Tree};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Which side of the trigger a sibling walk collects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

/// Siblings on one side of `node`, gathered at every level up to the scope root
fn scope_siblings(tree: &Tree, node: NodeId, scope: Scope, side: Side) -> Vec<NodeId> {
    let root_tag = scope.root_tag();
    let mut out = Vec::new();
    let mut current = node;
    while !tree.is_a(current, root_tag) {
        let Some(parent) = tree.parent(current) else {
            break;
        };
        match side {
            Side::Before => out.extend(tree.siblings_before(current)),
            Side::After => out.extend(tree.siblings_after(current)),
        }
        current = parent;
    }
    out
}

fn any_match(tree: &Tree, nodes: &[NodeId], query: &Query) -> bool {
    nodes.iter().any(|&node| !tree.find(node, query).is_empty())
}

/// Any one satisfied part is enough, so a rule can accept alternatives
/// such as a flag on the command or a config file written earlier.
fn consequent_met(rule: &Rule, tree: &Tree, candidate: NodeId) -> bool {
    let consequent = &rule.consequent;
    if let Some(query) = &consequent.in_node
        && !tree.find(candidate, query).is_empty()
    {
        return true;
    }
    if let Some(query) = &consequent.before_node
        && any_match(tree, &scope_siblings(tree, candidate, rule.scope, Side::Before), query)
    {
        return true;
    }
    if let Some(query) = &consequent.after_node
        && any_match(tree, &scope_siblings(tree, candidate, rule.scope, Side::After), query)
    {
        return true;
    }
    false
}

/// Nodes of an analysis tree that violate `rule`, in document order
pub fn violating_nodes(rule: &Rule, tree: &Tree) -> Vec<NodeId> {
    tree.find(tree.root(), &rule.query)
        .into_iter()
        .filter(|&candidate| {
            let met = consequent_met(rule, tree, candidate);
            trace!("{} candidate {}: consequent met = {}", rule.id, candidate, met);
            !met
        })
        .collect()
}

/// Live node behind an analysis node.
///
/// Nodes that exist only in the analysis view (option groups) map through
/// their nearest ancestor that does.
fn live_of(view: &Tree, node: NodeId) -> Option<NodeId> {
    view.original(node)
        .or_else(|| view.ancestors(node).into_iter().find_map(|id| view.original(id)))
}

/// A located rule failure
#[derive(Debug, Clone)]
pub struct Violation {
    rule: Arc<Rule>,
    node: NodeId,
    live: Option<NodeId>,
    position: Option<Position>,
}

impl Violation {
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn rule_id(&self) -> &'static str {
        self.rule.id
    }

    pub fn severity(&self) -> Severity {
        self.rule.severity
    }

    /// Matched node in the analysis tree
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Corresponding node of the live tree, which repairs edit
    pub fn live_node(&self) -> Option<NodeId> {
        self.live
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Whether the same live node still violates the rule in the current
    /// state of `doc`
    pub fn is_still_valid(&self, doc: &mut Dockerfile) -> bool {
        let Some(live) = self.live else {
            return false;
        };
        let view = doc.analysis();
        violating_nodes(&self.rule, &view)
            .into_iter()
            .any(|node| live_of(&view, node) == Some(live))
    }

    /// Apply the rule's repair to the live tree of `doc`
    pub fn repair(&self, doc: &mut Dockerfile) -> Result<()> {
        let Some(repair) = self.rule.repair else {
            return Err(DinghyError::repair_error(self.rule.id, "rule has no repair"));
        };
        let Some(live) = self.live else {
            return Err(DinghyError::repair_error(self.rule.id, "violation has no live node"));
        };
        repair(doc.tree_mut(), live)
            .map_err(|e| DinghyError::repair_error(self.rule.id, e.to_string()))
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{} {}: {}", position, self.rule.id, self.rule.description),
            None => write!(f, "{}: {}", self.rule.id, self.rule.description),
        }
    }
}

impl Serialize for Violation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Violation", 5)?;
        state.serialize_field("ruleId", self.rule.id)?;
        state.serialize_field("message", self.rule.description)?;
        state.serialize_field("severity", &self.rule.severity)?;
        state.serialize_field("repairable", &self.rule.is_repairable())?;
        state.serialize_field("position", &self.position)?;
        state.end()
    }
}

/// Violations of one rule in the current state of `doc`
pub fn check(rule: &Arc<Rule>, doc: &mut Dockerfile) -> Vec<Violation> {
    let view = doc.analysis();
    violating_nodes(rule, &view)
        .into_iter()
        .map(|node| Violation {
            rule: Arc::clone(rule),
            node,
            live: live_of(&view, node),
            position: view.position(node).cloned(),
        })
        .collect()
}

/// One entry of a [`RepairReport`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairRecord {
    pub rule_id: &'static str,
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RepairRecord {
    fn new(violation: &Violation, reason: Option<String>) -> Self {
        Self {
            rule_id: violation.rule_id(),
            position: violation.position.clone(),
            reason,
        }
    }
}

/// Outcome of a batch repair
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairReport {
    pub applied: Vec<RepairRecord>,
    /// Violations a previous repair already resolved or invalidated
    pub skipped: Vec<RepairRecord>,
    pub failed: Vec<RepairRecord>,
    /// Violations of rules that have no repair
    pub unrepairable: Vec<RepairRecord>,
}

impl RepairReport {
    /// Every violation was either repaired or made obsolete
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.unrepairable.is_empty()
    }

    pub fn total(&self) -> usize {
        self.applied.len() + self.skipped.len() + self.failed.len() + self.unrepairable.len()
    }
}

/// Repair `violations` in order, re-validating each one first.
///
/// Never stops early; every violation ends up in exactly one bucket.
pub fn repair_all(doc: &mut Dockerfile, violations: &[Violation]) -> RepairReport {
    let mut report = RepairReport::default();
    for violation in violations {
        if !violation.rule.is_repairable() {
            report.unrepairable.push(RepairRecord::new(violation, None));
            continue;
        }
        if violation.live.is_none() {
            warn!("{} matched no node of the live tree", violation.rule_id());
            report.failed.push(RepairRecord::new(
                violation,
                Some("violation has no live node".to_string()),
            ));
            continue;
        }
        if !violation.is_still_valid(doc) {
            debug!("Skipping stale violation of {}", violation.rule_id());
            report.skipped.push(RepairRecord::new(violation, None));
            continue;
        }
        match violation.repair(doc) {
            Ok(()) => {
                trace!("Repaired {}", violation);
                report.applied.push(RepairRecord::new(violation, None));
            }
            Err(e) => {
                warn!("Repair failed: {}", e);
                report.failed.push(RepairRecord::new(violation, Some(e.to_string())));
            }
        }
    }
    info!(
        "Applied {} repairs ({} skipped, {} failed, {} without repair)",
        report.applied.len(),
        report.skipped.len(),
        report.failed.len(),
        report.unrepairable.len()
    );
    report
}

/// An ordered collection of rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<Rule>>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// The complete built-in catalog
    pub fn builtin() -> Self {
        let mut set = Self::new();
        for rule in builtin::rules() {
            set.add(rule);
        }
        debug!("Loaded {} built-in rules", set.len());
        set
    }

    /// Built-in catalog filtered and re-weighted by `config`
    pub fn configured(config: &DinghyConfig) -> Self {
        let builtin = Self::builtin();
        for id in config.referenced_rules() {
            if builtin.get(id).is_none() {
                warn!("Configuration references unknown rule '{}'", id);
            }
        }
        let mut set = Self::new();
        for rule in &builtin.rules {
            if !config.is_enabled(rule.id) {
                debug!("Rule {} disabled by configuration", rule.id);
                continue;
            }
            let mut rule = Rule::clone(rule);
            if let Some(severity) = config.severity_for(rule.id).and_then(Severity::from_config) {
                rule.severity = severity;
            }
            set.add(rule);
        }
        set
    }

    /// Add a rule, replacing one with the same id
    pub fn add(&mut self, rule: Rule) {
        match self.rules.iter().position(|existing| existing.id == rule.id) {
            Some(index) => {
                debug!("Replacing rule '{}'", rule.id);
                self.rules[index] = Arc::new(rule);
            }
            None => self.rules.push(Arc::new(rule)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(Arc::as_ref)
    }

    pub fn infos(&self) -> Vec<RuleInfo> {
        self.iter().map(RuleInfo::from).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Violations of every rule, ordered by position then catalog order
    pub fn analyze(&self, doc: &mut Dockerfile) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in &self.rules {
            let found = check(rule, doc);
            if !found.is_empty() {
                debug!("{}: {} violations", rule.id, found.len());
            }
            violations.extend(found);
        }
        // positionless violations go last
        violations.sort_by_key(|v| (v.position.is_none(), v.position.as_ref().map(|p| p.start)));
        violations
    }

    /// Analyze `doc` and repair everything repairable
    pub fn refactor(&self, doc: &mut Dockerfile) -> RepairReport {
        let violations = self.analyze(doc);
        repair_all(doc, &violations)
    }
}
