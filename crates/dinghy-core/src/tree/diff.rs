//! Structural edit scripts between two subtrees
//!
//! Children are aligned by kind tag with a Myers diff; aligned pairs are
//! compared recursively, value mismatches become updates and kind mismatches
//! inside a replaced run become relabels.

use super::{NodeId, Tree};
use similar::{Algorithm, DiffOp, capture_diff_slices};

/// One edit turning the left subtree into the right one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEdit {
    /// `node` of the right tree is new under right-side `parent`
    Insert { parent: NodeId, node: NodeId },
    /// `node` of the left tree has no counterpart
    Delete { node: NodeId },
    /// Same kind, different value
    Update {
        old: NodeId,
        new: NodeId,
        from: String,
        to: String,
    },
    /// Kind changed in place
    Relabel {
        old: NodeId,
        new: NodeId,
        from: &'static str,
        to: &'static str,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub edits: Vec<TreeEdit>,
}

impl DiffSummary {
    /// Number of edits
    pub fn size(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

pub(super) fn diff(left: &Tree, a: NodeId, right: &Tree, b: NodeId) -> DiffSummary {
    let mut summary = DiffSummary::default();
    compare(left, a, right, b, &mut summary.edits);
    summary
}

fn compare(left: &Tree, a: NodeId, right: &Tree, b: NodeId, edits: &mut Vec<TreeEdit>) {
    if left.tag(a) != right.tag(b) {
        edits.push(TreeEdit::Relabel {
            old: a,
            new: b,
            from: left.tag(a),
            to: right.tag(b),
        });
    } else if left.value(a) != right.value(b) {
        edits.push(TreeEdit::Update {
            old: a,
            new: b,
            from: left.value(a).unwrap_or_default().to_string(),
            to: right.value(b).unwrap_or_default().to_string(),
        });
    }

    let old_children = left.sorted_children(a);
    let new_children = right.sorted_children(b);
    let old_tags: Vec<&str> = old_children.iter().map(|&c| left.tag(c)).collect();
    let new_tags: Vec<&str> = new_children.iter().map(|&c| right.tag(c)).collect();

    for op in capture_diff_slices(Algorithm::Myers, &old_tags, &new_tags) {
        match op {
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => {
                for offset in 0..len {
                    compare(
                        left,
                        old_children[old_index + offset],
                        right,
                        new_children[new_index + offset],
                        edits,
                    );
                }
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                edits.extend(
                    old_children[old_index..old_index + old_len]
                        .iter()
                        .map(|&node| TreeEdit::Delete { node }),
                );
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                edits.extend(
                    new_children[new_index..new_index + new_len]
                        .iter()
                        .map(|&node| TreeEdit::Insert { parent: b, node }),
                );
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let paired = old_len.min(new_len);
                for offset in 0..paired {
                    compare(
                        left,
                        old_children[old_index + offset],
                        right,
                        new_children[new_index + offset],
                        edits,
                    );
                }
                edits.extend(
                    old_children[old_index + paired..old_index + old_len]
                        .iter()
                        .map(|&node| TreeEdit::Delete { node }),
                );
                edits.extend(
                    new_children[new_index + paired..new_index + new_len]
                        .iter()
                        .map(|&node| TreeEdit::Insert { parent: b, node }),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_shell_fragment;

    #[test]
    fn test_identical_fragments_have_empty_diff() {
        let a = parse_shell_fragment("apt-get install -y curl").tree;
        let b = parse_shell_fragment("apt-get install -y curl").tree;
        assert!(a.diff(a.root(), &b, b.root()).is_empty());
    }

    #[test]
    fn test_inserted_argument_is_one_edit() {
        let a = parse_shell_fragment("yum install test").tree;
        let b = parse_shell_fragment("yum install -y test").tree;
        let summary = a.diff(a.root(), &b, b.root());
        // `-y` aligns with `test`, then `test` is inserted at the end
        assert_eq!(summary.size(), 2);
    }

    #[test]
    fn test_value_change_is_update() {
        let a = parse_shell_fragment("curl http://x").tree;
        let b = parse_shell_fragment("curl https://x").tree;
        let summary = a.diff(a.root(), &b, b.root());
        assert_eq!(summary.size(), 1);
        assert!(matches!(
            &summary.edits[0],
            super::TreeEdit::Update { from, to, .. } if from == "http://x" && to == "https://x"
        ));
    }
}
