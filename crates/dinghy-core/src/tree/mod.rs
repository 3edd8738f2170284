//! Arena-backed uniform syntax tree
//!
//! Every Dockerfile and shell construct is a node in one [`Tree`]. Nodes are
//! addressed by [`NodeId`]; ownership flows from parent to children and the
//! parent link is a plain index, so the structure has no reference cycles.
//!
//! Nodes carry a change flag used by the printer to decide between verbatim
//! copying and regeneration, plus a set of annotation tags added by the
//! enrichment and abstraction passes.

mod diff;
mod kind;

pub use diff::{DiffSummary, TreeEdit};
pub use kind::NodeKind;

use crate::position::{FileKey, Point, Position};
use crate::query::Query;
use indexmap::IndexSet;
use serde_json::{Map, Value, json};
use std::fmt;

/// Annotation tag attached to a node (`SC-APT-INSTALL`, `ABS-URL-HTTP`, ...)
pub type Tag = String;

/// Index of a node inside its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    position: Option<Position>,
    changed: bool,
    annotations: IndexSet<Tag>,
    original: Option<NodeId>,
}

/// A syntax tree with a designated root
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
    revision: u64,
}

impl Tree {
    /// Create a tree holding a single root node
    pub fn new(kind: NodeKind, position: Option<Position>) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            revision: 0,
        };
        tree.root = tree.new_node(kind, position);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Counter bumped by every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.revision += 1;
        &mut self.nodes[id.0]
    }

    /// Allocate a detached node. New nodes start out changed.
    pub fn new_node(&mut self, kind: NodeKind, position: Option<Position>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.revision += 1;
        self.nodes.push(NodeData {
            kind,
            children: Vec::new(),
            parent: None,
            position,
            changed: true,
            annotations: IndexSet::new(),
            original: None,
        });
        id
    }

    /// Clear every change flag. Parsers call this once the tree is built.
    pub(crate) fn reset_changes(&mut self) {
        for node in &mut self.nodes {
            node.changed = false;
        }
    }

    // ------------------------------------------------------------------
    // Node accessors
    // ------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    pub fn tag(&self, id: NodeId) -> &'static str {
        self.data(id).kind.tag()
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.data(id).kind.value()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Children in storage order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn position(&self, id: NodeId) -> Option<&Position> {
        self.data(id).position.as_ref()
    }

    pub fn annotations(&self, id: NodeId) -> &IndexSet<Tag> {
        &self.data(id).annotations
    }

    /// Counterpart of this node in the tree it was cloned from
    pub fn original(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).original
    }

    pub fn is_changed(&self, id: NodeId) -> bool {
        self.data(id).changed
    }

    /// Whether the node or any of its descendants changed
    pub fn has_changes(&self, id: NodeId) -> bool {
        let node = self.data(id);
        node.changed || node.children.iter().any(|&child| self.has_changes(child))
    }

    /// Type check used by queries: structural kind or annotation
    pub fn is_a(&self, id: NodeId, tag: &str) -> bool {
        let node = self.data(id);
        node.kind.tag() == tag || node.annotations.contains(tag)
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Replace the value of a value node; returns false for structural nodes
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> bool {
        let node = self.data_mut(id);
        match node.kind.value_mut() {
            Some(slot) => {
                *slot = value.into();
                node.changed = true;
                true
            }
            None => false,
        }
    }

    pub fn set_position(&mut self, id: NodeId, position: Option<Position>) {
        self.data_mut(id).position = position;
    }

    pub fn mark_changed(&mut self, id: NodeId) {
        self.data_mut(id).changed = true;
    }

    /// Append an annotation tag; duplicates are ignored
    pub fn annotate(&mut self, id: NodeId, tag: impl Into<Tag>) {
        self.data_mut(id).annotations.insert(tag.into());
    }

    pub fn set_original(&mut self, id: NodeId, original: Option<NodeId>) {
        self.data_mut(id).original = original;
    }

    /// Append `child` to `parent` and mark it changed
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.data(parent).children.len();
        self.insert_child(parent, len, child);
    }

    pub fn add_child_opt(&mut self, parent: NodeId, child: Option<NodeId>) {
        if let Some(child) = child {
            self.add_child(parent, child);
        }
    }

    pub fn add_children(&mut self, parent: NodeId, children: impl IntoIterator<Item = NodeId>) {
        for child in children {
            self.add_child(parent, child);
        }
    }

    /// Insert `child` at a storage index of `parent` (clamped to the end).
    ///
    /// A child that is still attached elsewhere is detached first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if self.data(child).parent.is_some() {
            self.remove(child);
        }
        let node = self.data_mut(parent);
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        let child_node = self.data_mut(child);
        child_node.parent = Some(parent);
        child_node.changed = true;
    }

    /// Insert `node` right after `sibling` under the same parent
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.parent(sibling) else {
            return false;
        };
        let Some(index) = self.storage_index(parent, sibling) else {
            return false;
        };
        self.insert_child(parent, index + 1, node);
        true
    }

    /// Insert `node` right before `sibling` under the same parent
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.parent(sibling) else {
            return false;
        };
        let Some(index) = self.storage_index(parent, sibling) else {
            return false;
        };
        self.insert_child(parent, index, node);
        true
    }

    fn storage_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.data(parent).children.iter().position(|&c| c == child)
    }

    /// Swap `new` into the slot of `old`.
    ///
    /// `new` inherits the position of `old` when it has none. Returns false
    /// when `old` has no parent.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        let Some(index) = self.storage_index(parent, old) else {
            return false;
        };
        if self.data(new).parent.is_some() {
            self.remove(new);
        }
        if self.data(new).position.is_none() {
            let inherited = self.data(old).position.clone();
            self.data_mut(new).position = inherited;
        }
        let index = self.storage_index(parent, old).unwrap_or(index);
        self.data_mut(parent).children[index] = new;
        let old_node = self.data_mut(old);
        old_node.parent = None;
        old_node.changed = true;
        let new_node = self.data_mut(new);
        new_node.parent = Some(parent);
        new_node.changed = true;
        true
    }

    /// Detach a node from its parent, compacting the sibling list.
    ///
    /// The parent is marked changed so the printer regenerates it.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let parent_node = self.data_mut(parent);
        parent_node.children.retain(|&c| c != id);
        parent_node.changed = true;
        let node = self.data_mut(id);
        node.parent = None;
        node.changed = true;
        true
    }

    /// Deep-copy a subtree of another tree into this arena (detached)
    pub fn graft(&mut self, other: &Tree, other_root: NodeId) -> NodeId {
        let source = other.data(other_root);
        let copy = self.new_node(source.kind.clone(), source.position.clone());
        self.data_mut(copy).annotations = source.annotations.clone();
        for &child in &source.children {
            let child_copy = self.graft(other, child);
            self.add_child(copy, child_copy);
        }
        copy
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    /// Children sorted by start position.
    ///
    /// Only children positioned in the dominant file of the parent (its own
    /// file, else the file of its first positioned child) contribute a sort
    /// key. Other children keep the slot after their preceding sibling.
    pub fn sorted_children(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.data(id);
        let dominant = node.position.as_ref().map(Position::file_key).or_else(|| {
            node.children
                .iter()
                .find_map(|&c| self.data(c).position.as_ref().map(Position::file_key))
        });
        let mut last = Point::default();
        let mut keyed: Vec<(Point, NodeId)> = node
            .children
            .iter()
            .map(|&child| {
                if let Some(pos) = &self.data(child).position
                    && Some(pos.file_key()) == dominant
                {
                    last = pos.start;
                }
                (last, child)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        keyed.into_iter().map(|(_, child)| child).collect()
    }

    pub fn start(&self, id: NodeId) -> Option<Point> {
        self.position(id).map(|p| p.start)
    }

    /// Strict start-point order between two positioned nodes
    pub fn is_before(&self, a: NodeId, b: NodeId) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(pa), Some(pb)) => pa.start < pb.start,
            _ => false,
        }
    }

    /// Whether the range of `a` lies within the range of `b`
    pub fn is_inside(&self, a: NodeId, b: NodeId) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(pa), Some(pb)) => pa.same_file(pb) && pb.contains(pa),
            _ => false,
        }
    }

    /// Whether `ancestor` is on the parent chain of `id` (or is `id`)
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Position-sorted siblings strictly before `id`
    pub fn siblings_before(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        self.sorted_children(parent)
            .into_iter()
            .take_while(|&c| c != id)
            .collect()
    }

    /// Position-sorted siblings strictly after `id`
    pub fn siblings_after(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        self.sorted_children(parent)
            .into_iter()
            .skip_while(|&c| c != id)
            .skip(1)
            .collect()
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// First immediate child with the given kind or annotation
    pub fn child(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.sorted_children(id)
            .into_iter()
            .find(|&c| self.is_a(c, tag))
    }

    /// All immediate children with the given kind or annotation
    pub fn children_of(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.sorted_children(id)
            .into_iter()
            .filter(|&c| self.is_a(c, tag))
            .collect()
    }

    /// First descendant with the given kind or annotation, in document order
    pub fn element(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        for child in self.sorted_children(id) {
            if self.is_a(child, tag) {
                return Some(child);
            }
            if let Some(found) = self.element(child, tag) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given kind or annotation, in document order
    pub fn elements(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.preorder(id, false, &mut |tree, node| {
            if tree.is_a(node, tag) {
                out.push(node);
            }
        });
        out
    }

    /// Nearest ancestor with the given kind or annotation
    pub fn ancestor(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self.is_a(node, tag) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Parent chain from the immediate parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// Call `callback` for each child accepted by `filter`, in position order.
    ///
    /// The index passed to the callback counts accepted children only.
    pub fn iterate<P, F>(&self, id: NodeId, filter: P, mut callback: F)
    where
        P: Fn(&Tree, NodeId) -> bool,
        F: FnMut(&Tree, NodeId, usize),
    {
        let mut index = 0;
        for child in self.sorted_children(id) {
            if filter(self, child) {
                callback(self, child, index);
                index += 1;
            }
        }
    }

    /// Breadth-before-depth walk: all immediate children are visited, then
    /// each child's subtree in turn.
    ///
    /// Returns false as soon as the callback does, aborting the walk.
    pub fn traverse<F>(&self, id: NodeId, include_self: bool, mut callback: F) -> bool
    where
        F: FnMut(&Tree, NodeId) -> bool,
    {
        if include_self && !callback(self, id) {
            return false;
        }
        self.traverse_children(id, &mut callback)
    }

    fn traverse_children(&self, id: NodeId, callback: &mut dyn FnMut(&Tree, NodeId) -> bool) -> bool {
        let children = self.sorted_children(id);
        for &child in &children {
            if !callback(self, child) {
                return false;
            }
        }
        for &child in &children {
            if !self.traverse_children(child, callback) {
                return false;
            }
        }
        true
    }

    /// Document-order walk over sorted children
    pub fn preorder(&self, id: NodeId, include_self: bool, visit: &mut dyn FnMut(&Tree, NodeId)) {
        if include_self {
            visit(self, id);
        }
        for child in self.sorted_children(id) {
            self.preorder(child, true, visit);
        }
    }

    /// Every node of the subtree (self included) matching `query`, in
    /// document order
    pub fn find(&self, id: NodeId, query: &Query) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.preorder(id, true, &mut |tree, node| {
            if query.matches(tree, node) {
                out.push(node);
            }
        });
        out
    }

    pub fn matches(&self, id: NodeId, query: &Query) -> bool {
        query.matches(self, id)
    }

    /// Structural edit script turning subtree `a` into subtree `b` of `other`
    pub fn diff(&self, a: NodeId, other: &Tree, b: NodeId) -> DiffSummary {
        diff::diff(self, a, other, b)
    }

    // ------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------

    /// Concatenated values of all value nodes in the subtree
    pub fn text_value(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.preorder(id, true, &mut |tree, node| {
            if let Some(value) = tree.value(node) {
                out.push_str(value);
            }
        });
        out
    }

    /// Word naming a simple command
    pub fn command_name(&self, command: NodeId) -> Option<NodeId> {
        let wrapper = self.child(command, "BASH-COMMAND-COMMAND")?;
        self.sorted_children(wrapper).into_iter().next()
    }

    pub fn command_name_text(&self, command: NodeId) -> Option<String> {
        self.command_name(command).map(|word| self.text_value(word))
    }

    /// Argument words of a simple command
    pub fn command_args(&self, command: NodeId) -> Vec<NodeId> {
        match self.child(command, "BASH-COMMAND-ARGS") {
            Some(args) => self.sorted_children(args),
            None => Vec::new(),
        }
    }

    pub fn command_word_values(&self, command: NodeId) -> Vec<String> {
        self.command_args(command)
            .into_iter()
            .map(|word| self.text_value(word))
            .collect()
    }

    /// Keyword token of a Dockerfile instruction
    pub fn instruction_keyword(&self, instruction: NodeId) -> Option<NodeId> {
        self.child(instruction, "DOCKER-KEYWORD")
    }

    /// Shell script embedded in a RUN/CMD/ENTRYPOINT/SHELL instruction
    pub fn script_of(&self, instruction: NodeId) -> Option<NodeId> {
        self.child(instruction, "BASH-SCRIPT")
    }

    /// Top-level instruction (child of the file root) containing `id`
    pub fn instruction_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if matches!(self.kind(parent), NodeKind::DockerFile) {
                return Some(current);
            }
            current = parent;
        }
        None
    }

    /// File identity of a node's position
    pub fn file_key(&self, id: NodeId) -> Option<FileKey> {
        self.position(id).map(Position::file_key)
    }

    /// JSON dump: `{type, children, value, position}` per node
    pub fn to_json(&self, id: NodeId) -> Value {
        let node = self.data(id);
        let mut object = Map::new();
        object.insert("type".into(), json!(node.kind.tag()));
        if let Some(value) = node.kind.value() {
            object.insert("value".into(), json!(value));
        }
        if let Some(position) = &node.position {
            object.insert("position".into(), json!(position));
        }
        if !node.annotations.is_empty() {
            let tags: Vec<&str> = node.annotations.iter().map(String::as_str).collect();
            object.insert("annotations".into(), json!(tags));
        }
        let children: Vec<Value> = self
            .sorted_children(id)
            .into_iter()
            .map(|child| self.to_json(child))
            .collect();
        object.insert("children".into(), Value::Array(children));
        Value::Object(object)
    }
}

/// Deep copy for analysis passes.
///
/// Node ids are preserved, every node is marked changed and links back to
/// its counterpart through [`Tree::original`].
impl Clone for Tree {
    fn clone(&self) -> Self {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| NodeData {
                changed: true,
                original: Some(NodeId(index)),
                ..node.clone()
            })
            .collect();
        Self {
            nodes,
            root: self.root,
            revision: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourceFile;

    fn leaf(tree: &mut Tree, parent: NodeId, value: &str, col: usize) -> NodeId {
        let pos = Position::range(Point::new(0, col), Point::new(0, col + value.len()));
        let id = tree.new_node(NodeKind::BashLiteral(value.into()), Some(pos));
        tree.add_child(parent, id);
        id
    }

    #[test]
    fn test_sorted_children_follow_position() {
        let mut tree = Tree::new(NodeKind::BashWord, None);
        let root = tree.root();
        let late = leaf(&mut tree, root, "b", 5);
        let early = leaf(&mut tree, root, "a", 1);
        assert_eq!(tree.sorted_children(root), vec![early, late]);
        assert_eq!(tree.children(root), &[late, early]);
    }

    #[test]
    fn test_foreign_file_children_keep_their_slot() {
        let file = SourceFile::new("abcdefgh");
        let mut tree = Tree::new(NodeKind::BashWord, Some(Position::at(0, 0).with_file(file.clone())));
        let root = tree.root();
        let a = tree.new_node(
            NodeKind::BashLiteral("a".into()),
            Some(Position::at(0, 0).with_file(file.clone())),
        );
        let b = tree.new_node(
            NodeKind::BashLiteral("b".into()),
            Some(Position::at(0, 4).with_file(file)),
        );
        let snippet = tree.new_node(NodeKind::BashLiteral("x".into()), Some(Position::at(0, 0)));
        tree.add_children(root, [a, b]);
        tree.insert_child(root, 1, snippet);
        assert_eq!(tree.sorted_children(root), vec![a, snippet, b]);
    }

    #[test]
    fn test_remove_compacts_and_marks_parent() {
        let mut tree = Tree::new(NodeKind::BashWord, None);
        let root = tree.root();
        let a = leaf(&mut tree, root, "a", 0);
        let b = leaf(&mut tree, root, "b", 1);
        tree.reset_changes();
        assert!(tree.remove(a));
        assert_eq!(tree.children(root), &[b]);
        assert!(tree.is_changed(root));
        assert!(!tree.remove(a));
    }

    #[test]
    fn test_replace_inherits_position() {
        let mut tree = Tree::new(NodeKind::BashWord, None);
        let root = tree.root();
        let a = leaf(&mut tree, root, "a", 3);
        let b = tree.new_node(NodeKind::BashLiteral("z".into()), None);
        assert!(tree.replace(a, b));
        assert_eq!(tree.start(b), Some(Point::new(0, 3)));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.children(root), &[b]);
    }

    #[test]
    fn test_has_changes_propagates_from_descendants() {
        let mut tree = Tree::new(NodeKind::BashScript, None);
        let root = tree.root();
        let word = tree.new_node(NodeKind::BashWord, None);
        tree.add_child(root, word);
        let lit = leaf(&mut tree, word, "x", 0);
        tree.reset_changes();
        assert!(!tree.has_changes(root));
        tree.set_value(lit, "y");
        assert!(tree.has_changes(root));
        assert!(!tree.is_changed(word));
    }

    #[test]
    fn test_clone_preserves_ids_and_links_originals() {
        let mut tree = Tree::new(NodeKind::BashWord, None);
        let root = tree.root();
        let a = leaf(&mut tree, root, "a", 0);
        tree.reset_changes();
        let copy = tree.clone();
        assert_eq!(copy.original(a), Some(a));
        assert!(copy.is_changed(a));
        assert!(!tree.is_changed(a));
        assert_eq!(copy.value(a), Some("a"));
    }

    #[test]
    fn test_traverse_visits_children_before_grandchildren() {
        let mut tree = Tree::new(NodeKind::BashScript, None);
        let root = tree.root();
        let w1 = tree.new_node(NodeKind::BashWord, Some(Position::at(0, 0)));
        let w2 = tree.new_node(NodeKind::BashWord, Some(Position::at(0, 5)));
        tree.add_children(root, [w1, w2]);
        let l1 = leaf(&mut tree, w1, "a", 0);
        let l2 = leaf(&mut tree, w2, "b", 5);

        let mut seen = Vec::new();
        assert!(tree.traverse(root, true, |_, id| {
            seen.push(id);
            true
        }));
        assert_eq!(seen, vec![root, w1, w2, l1, l2]);

        let mut count = 0;
        let completed = tree.traverse(root, false, |_, _| {
            count += 1;
            count < 2
        });
        assert!(!completed);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_iterate_counts_filtered_children() {
        let mut tree = Tree::new(NodeKind::BashWord, None);
        let root = tree.root();
        leaf(&mut tree, root, "a", 0);
        let op = tree.new_node(NodeKind::BashOperator("&&".into()), Some(Position::at(0, 2)));
        tree.add_child(root, op);
        leaf(&mut tree, root, "b", 5);
        let mut seen = Vec::new();
        tree.iterate(
            root,
            |t, id| t.tag(id) == "BASH-LITERAL",
            |t, id, index| seen.push((t.text_value(id), index)),
        );
        assert_eq!(seen, vec![("a".to_string(), 0), ("b".to_string(), 1)]);
    }

    #[test]
    fn test_graft_copies_subtree() {
        let mut fragment = Tree::new(NodeKind::BashWord, None);
        let froot = fragment.root();
        leaf(&mut fragment, froot, "-y", 0);
        let mut tree = Tree::new(NodeKind::BashCommandArgs, None);
        let copy = tree.graft(&fragment, froot);
        tree.add_child(tree.root(), copy);
        assert_eq!(tree.text_value(copy), "-y");
        assert_eq!(tree.parent(copy), Some(tree.root()));
    }
}
