//! Structural pattern matching over the syntax tree
//!
//! Rules describe the code they look for as a [`Query`]: a recursive pattern
//! over node kinds (or annotation tags), values and children, combined with
//! logical and ordered-sequence operators.

use crate::tree::{NodeId, Tree};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Node whose kind or annotations contain `tag`
    Node {
        tag: String,
        value: Option<String>,
        children: Vec<Query>,
    },
    /// Any node; every child query must match some immediate child
    One(Vec<Query>),
    /// Any node whose subtree contains matches for the child queries in
    /// strictly increasing source order
    All(Vec<Query>),
    And(Vec<Query>),
    Or(Vec<Query>),
    /// Value node with exactly this value, whatever its kind
    Value(String),
}

/// Start a node query for a kind or annotation tag
pub fn q(tag: impl Into<String>) -> Query {
    Query::Node {
        tag: tag.into(),
        value: None,
        children: Vec::new(),
    }
}

impl Query {
    pub fn one(children: impl IntoIterator<Item = Query>) -> Self {
        Self::One(children.into_iter().collect())
    }

    pub fn all(children: impl IntoIterator<Item = Query>) -> Self {
        Self::All(children.into_iter().collect())
    }

    pub fn and(children: impl IntoIterator<Item = Query>) -> Self {
        Self::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Query>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    pub fn value_of(literal: impl Into<String>) -> Self {
        Self::Value(literal.into())
    }

    /// Require an exact value (node queries only)
    pub fn value(mut self, literal: impl Into<String>) -> Self {
        if let Self::Node { value, .. } = &mut self {
            *value = Some(literal.into());
        }
        self
    }

    /// Add a child query (node and `One` queries)
    pub fn child(mut self, query: Query) -> Self {
        match &mut self {
            Self::Node { children, .. } | Self::One(children) => children.push(query),
            _ => {}
        }
        self
    }

    /// Whether `id` matches this query
    pub fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        match self {
            Self::Node {
                tag,
                value,
                children,
            } => {
                if !tree.is_a(id, tag) {
                    return false;
                }
                if let Some(expected) = value
                    && tree.value(id) != Some(expected.as_str())
                {
                    return false;
                }
                matches_children(tree, id, children)
            }
            Self::One(children) => matches_children(tree, id, children),
            Self::All(children) => matches_ordered(tree, id, children),
            Self::And(children) => children.iter().all(|query| query.matches(tree, id)),
            Self::Or(children) => children.iter().any(|query| query.matches(tree, id)),
            Self::Value(expected) => tree.value(id) == Some(expected.as_str()),
        }
    }
}

fn matches_children(tree: &Tree, id: NodeId, queries: &[Query]) -> bool {
    if queries.is_empty() {
        return true;
    }
    let children = tree.sorted_children(id);
    queries
        .iter()
        .all(|query| children.iter().any(|&child| query.matches(tree, child)))
}

fn matches_ordered(tree: &Tree, id: NodeId, queries: &[Query]) -> bool {
    let mut cursor: Option<NodeId> = None;
    for query in queries {
        let next = tree
            .find(id, query)
            .into_iter()
            .find(|&candidate| cursor.is_none_or(|before| tree.is_before(before, candidate)));
        match next {
            Some(found) => cursor = Some(found),
            None => return false,
        }
    }
    true
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, items: &[Query]) -> fmt::Result {
            write!(f, "{name}(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str(")")
        }
        match self {
            Self::Node {
                tag,
                value,
                children,
            } => {
                f.write_str(tag)?;
                if let Some(value) = value {
                    write!(f, "={value:?}")?;
                }
                if !children.is_empty() {
                    list(f, "", children)?;
                }
                Ok(())
            }
            Self::One(items) => list(f, "_", items),
            Self::All(items) => list(f, "*", items),
            Self::And(items) => list(f, "and", items),
            Self::Or(items) => list(f, "or", items),
            Self::Value(value) => write!(f, "{value:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_shell_fragment;

    #[test]
    fn test_node_query_matches_kind_and_value() {
        let out = parse_shell_fragment("echo hello");
        let tree = &out.tree;
        let hits = tree.find(tree.root(), &q("BASH-LITERAL").value("hello"));
        assert_eq!(hits.len(), 1);
        assert!(tree.find(tree.root(), &q("BASH-LITERAL").value("bye")).is_empty());
    }

    #[test]
    fn test_children_are_existential() {
        let out = parse_shell_fragment("echo a b");
        let tree = &out.tree;
        let query = q("BASH-COMMAND").child(q("BASH-COMMAND-ARGS").child(q("BASH-WORD")).child(q("BASH-WORD")));
        assert_eq!(tree.find(tree.root(), &query).len(), 1);
    }

    #[test]
    fn test_all_requires_strict_order() {
        let out = parse_shell_fragment("x; y");
        let tree = &out.tree;
        let forward = Query::all([Query::value_of("x"), Query::value_of("y")]);
        let backward = Query::all([Query::value_of("y"), Query::value_of("x")]);
        assert!(forward.matches(tree, tree.root()));
        assert!(!backward.matches(tree, tree.root()));
    }

    #[test]
    fn test_all_does_not_reuse_the_same_node() {
        let out = parse_shell_fragment("x");
        let tree = &out.tree;
        let twice = Query::all([Query::value_of("x"), Query::value_of("x")]);
        assert!(!twice.matches(tree, tree.root()));
    }

    #[test]
    fn test_logical_combinators() {
        let out = parse_shell_fragment("ls");
        let tree = &out.tree;
        let lit = tree.elements(tree.root(), "BASH-LITERAL")[0];
        assert!(Query::or([Query::value_of("nope"), Query::value_of("ls")]).matches(tree, lit));
        assert!(!Query::and([Query::value_of("nope"), Query::value_of("ls")]).matches(tree, lit));
    }

    #[test]
    fn test_display() {
        let query = q("BASH-COMMAND").child(q("SC-APT-INSTALL"));
        assert_eq!(query.to_string(), "BASH-COMMAND(SC-APT-INSTALL)");
    }
}
