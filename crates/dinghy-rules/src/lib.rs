//! Dinghy Rules
//!
//! Best-practice rules for Dockerfiles. Rules are matched against the
//! enriched and abstracted analysis view of a [`dinghy_core::Dockerfile`];
//! the resulting violations point back into the live tree, which repairs
//! edit in place so that printing keeps all untouched formatting.

pub mod builtin;
pub mod engine;
pub mod repair;
pub mod rule;

pub use engine::{RepairRecord, RepairReport, RuleSet, Violation, check, repair_all, violating_nodes};
pub use rule::{Consequent, RepairFn, Rule, RuleInfo, Scope, Severity};
