//! Built-in rule catalog
//!
//! Rules are grouped by concern; each group exposes its ids as constants
//! and a `rules()` constructor. Catalog order is the order repairs run in.

pub mod hygiene;
pub mod network;
pub mod packages;

use crate::rule::Rule;

/// Every built-in rule, in catalog order
pub fn rules() -> Vec<Rule> {
    let mut rules = packages::rules();
    rules.extend(network::rules());
    rules.extend(hygiene::rules());
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let rules = rules();
        let ids: HashSet<&str> = rules.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), rules.len());
        assert_eq!(rules.len(), 20);
    }

    #[test]
    fn test_report_only_rules() {
        let unrepairable: Vec<&str> = rules()
            .iter()
            .filter(|r| !r.is_repairable())
            .map(|r| r.id)
            .collect();
        assert_eq!(
            unrepairable,
            vec![
                hygiene::TAR_SOMETHING_RM_THE_SOMETHING,
                hygiene::MKDIR_USR_SRC_THEN_REMOVE,
                hygiene::RM_RECURSIVE_AFTER_MKTEMP_D,
            ]
        );
    }
}
