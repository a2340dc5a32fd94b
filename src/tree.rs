//! Strictly hierarchical projection of holons for the tree view.
//!
//! Every [`TreeNode`] is owned by exactly one parent, so the structure can
//! never share nodes or form cycles. The tree is independent of the graph
//! view; both use the same [`Holon`] entity.

use crate::holon::{Holon, HolonData, HolonId};
use log::debug;
use serde::{Deserialize, Serialize};

/// A holon with its ordered, exclusively owned children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub holon: Holon,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: impl Into<HolonId>, label: impl Into<String>) -> Self {
        Self {
            holon: Holon::new(id, label),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn id(&self) -> &str {
        &self.holon.id
    }

    pub fn label(&self) -> &str {
        self.holon.label()
    }

    /// Pre-order iterator over this node and its descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    fn find(&self, id: &str) -> Option<&TreeNode> {
        self.iter().find(|n| n.id() == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        if self.id() == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Splice out the descendant with `id`. Never matches `self`.
    fn remove_descendant(&mut self, id: &str) -> bool {
        if let Some(index) = self.children.iter().position(|c| c.id() == id) {
            self.children.remove(index);
            return true;
        }
        self.children.iter_mut().any(|c| c.remove_descendant(id))
    }

    /// Ids from `self` down to the node with `id`, if present.
    fn path_to(&self, id: &str) -> Option<Vec<HolonId>> {
        if self.id() == id {
            return Some(vec![self.holon.id.clone()]);
        }
        self.children.iter().find_map(|c| {
            c.path_to(id).map(|mut rest| {
                rest.insert(0, self.holon.id.clone());
                rest
            })
        })
    }
}

/// Depth-first pre-order traversal.
pub struct Iter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// The tree view's data: an optional root plus an id counter.
#[derive(Clone, Debug, Default)]
pub struct TreeProjection {
    root: Option<TreeNode>,
    next_id: u64,
}

impl TreeProjection {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: TreeNode) -> Self {
        Self {
            root: Some(root),
            next_id: 0,
        }
    }

    /// The default "Information System" tree with its two top-level branches.
    pub fn information_system() -> Self {
        Self::with_root(
            TreeNode::new("root", "Information System")
                .with_child(TreeNode::new("Stakeholder", "Stakeholder"))
                .with_child(TreeNode::new("Infrastructure", "Infrastructure")),
        )
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        self.root.as_ref().and_then(|r| r.find(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.root.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Append `child` to the children of `parent_id`.
    ///
    /// No-op if the parent is missing or any id in `child`'s subtree is
    /// already in the tree.
    pub fn add_child(&mut self, parent_id: &str, child: TreeNode) -> bool {
        if child.iter().any(|n| self.contains(n.id())) {
            debug!("tree: rejected child {}: id already in tree", child.id());
            return false;
        }
        let Some(parent) = self.root.as_mut().and_then(|r| r.find_mut(parent_id)) else {
            return false;
        };
        debug!("tree: add {} under {}", child.id(), parent_id);
        parent.children.push(child);
        true
    }

    /// Create a labelled child of `parent_id` with a generated id.
    pub fn new_child(&mut self, parent_id: &str, label: impl Into<String>) -> Option<HolonId> {
        if !self.contains(parent_id) {
            return None;
        }
        let id = self.fresh_id(parent_id);
        self.add_child(parent_id, TreeNode::new(id.clone(), label))
            .then_some(id)
    }

    /// Make a new root whose sole child is the current root.
    ///
    /// On an empty tree the new node becomes a lone root.
    pub fn add_parent(&mut self, label: impl Into<String>) -> HolonId {
        let id = self.fresh_id("root");
        let mut new_root = TreeNode::new(id.clone(), label);
        if let Some(old_root) = self.root.take() {
            new_root.children.push(old_root);
        }
        debug!("tree: new root {}", id);
        self.root = Some(new_root);
        id
    }

    /// Remove the node with `id` and its whole subtree.
    ///
    /// Removing the root empties the tree.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        if root.id() == id {
            self.root = None;
            debug!("tree: removed root {}", id);
            return true;
        }
        let removed = root.remove_descendant(id);
        if removed {
            debug!("tree: removed {}", id);
        }
        removed
    }

    /// Replace a node's label/description. Children are untouched.
    pub fn update(&mut self, id: &str, data: HolonData) -> bool {
        match self.root.as_mut().and_then(|r| r.find_mut(id)) {
            Some(node) => {
                node.holon.data = data;
                true
            }
            None => false,
        }
    }

    pub fn parent_of(&self, id: &str) -> Option<&TreeNode> {
        self.iter()
            .find(|n| n.children.iter().any(|c| c.id() == id))
    }

    /// Ids from the root down to `id`, inclusive. Empty if `id` is absent.
    pub fn ancestors(&self, id: &str) -> Vec<HolonId> {
        self.root
            .as_ref()
            .and_then(|r| r.path_to(id))
            .unwrap_or_default()
    }

    fn fresh_id(&mut self, prefix: &str) -> HolonId {
        loop {
            self.next_id += 1;
            let id = format!("{}-{}", prefix, self.next_id);
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// root ─┬─ a ─┬─ a1
    ///       │     └─ a2
    ///       └─ b ─── b1
    fn setup_tree() -> TreeProjection {
        TreeProjection::with_root(
            TreeNode::new("root", "Root")
                .with_child(
                    TreeNode::new("a", "A")
                        .with_child(TreeNode::new("a1", "A1"))
                        .with_child(TreeNode::new("a2", "A2")),
                )
                .with_child(TreeNode::new("b", "B").with_child(TreeNode::new("b1", "B1"))),
        )
    }

    fn ids(tree: &TreeProjection) -> Vec<&str> {
        tree.iter().map(TreeNode::id).collect()
    }

    // ========================================================================
    // Construction and traversal
    // ========================================================================

    #[test]
    fn test_information_system_seed() {
        let tree = TreeProjection::information_system();
        assert_eq!(ids(&tree), vec!["root", "Stakeholder", "Infrastructure"]);
        assert_eq!(tree.root().unwrap().label(), "Information System");
    }

    #[test]
    fn test_iter_is_preorder() {
        let tree = setup_tree();
        assert_eq!(ids(&tree), vec!["root", "a", "a1", "a2", "b", "b1"]);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_empty_tree() {
        let tree = TreeProjection::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.find("root").is_none());
    }

    // ========================================================================
    // add_child() / new_child()
    // ========================================================================

    #[test]
    fn test_add_child_appends_in_order() {
        let mut tree = setup_tree();
        assert!(tree.add_child("a", TreeNode::new("a3", "A3")));

        let children: Vec<&str> = tree.find("a").unwrap().children.iter().map(TreeNode::id).collect();
        assert_eq!(children, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn test_add_child_missing_parent_is_noop() {
        let mut tree = setup_tree();
        assert!(!tree.add_child("missing", TreeNode::new("x", "X")));
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_add_child_rejects_taken_id() {
        let mut tree = setup_tree();
        assert!(!tree.add_child("a", TreeNode::new("b1", "Again")));
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_new_child_generates_prefixed_id() {
        let mut tree = setup_tree();
        let id = tree.new_child("b", "B2").unwrap();

        assert!(id.starts_with("b-"));
        assert_eq!(tree.parent_of(&id).unwrap().id(), "b");
        assert!(tree.new_child("missing", "X").is_none());
    }

    // ========================================================================
    // add_parent()
    // ========================================================================

    #[test]
    fn test_add_parent_wraps_root() {
        let mut tree = setup_tree();
        let before = tree.root().cloned().unwrap();

        let id = tree.add_parent("Enterprise");

        let root = tree.root().unwrap();
        assert_eq!(root.id(), id);
        assert!(id.starts_with("root-"));
        assert_eq!(root.children, vec![before]);
    }

    #[test]
    fn test_add_parent_on_empty_tree() {
        let mut tree = TreeProjection::new();
        let id = tree.add_parent("Lone");

        assert_eq!(ids(&tree), vec![id.as_str()]);
    }

    // ========================================================================
    // remove_node()
    // ========================================================================

    #[test]
    fn test_remove_root_empties_tree() {
        let mut tree = setup_tree();
        assert!(tree.remove_node("root"));
        assert!(tree.is_empty());
        assert!(!tree.remove_node("root"));
    }

    #[test]
    fn test_remove_child_removes_exact_subtree() {
        let mut tree = setup_tree();
        let sibling = tree.find("b").cloned().unwrap();

        assert!(tree.remove_node("a"));

        assert_eq!(ids(&tree), vec!["root", "b", "b1"]);
        assert_eq!(tree.find("b"), Some(&sibling));
    }

    #[test]
    fn test_remove_deep_leaf() {
        let mut tree = setup_tree();
        assert!(tree.remove_node("a2"));
        assert_eq!(ids(&tree), vec!["root", "a", "a1", "b", "b1"]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut tree = setup_tree();
        assert!(!tree.remove_node("zzz"));
        assert_eq!(tree.len(), 6);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[test]
    fn test_update_keeps_children() {
        let mut tree = setup_tree();
        assert!(tree.update("a", HolonData::new("Alpha").with_description("first")));

        let node = tree.find("a").unwrap();
        assert_eq!(node.label(), "Alpha");
        assert_eq!(node.holon.description(), Some("first"));
        assert_eq!(node.children.len(), 2);
        assert!(!tree.update("missing", HolonData::new("X")));
    }

    #[test]
    fn test_parent_of_and_ancestors() {
        let tree = setup_tree();
        assert_eq!(tree.parent_of("b1").unwrap().id(), "b");
        assert!(tree.parent_of("root").is_none());
        assert_eq!(tree.ancestors("a2"), vec!["root", "a", "a2"]);
        assert!(tree.ancestors("missing").is_empty());
    }

    #[test]
    fn test_serializes_nested_shape() {
        let tree = TreeProjection::information_system();
        let json = serde_json::to_value(tree.root().unwrap()).unwrap();

        assert_eq!(json["id"], "root");
        assert_eq!(json["data"]["label"], "Information System");
        assert_eq!(json["children"][1]["id"], "Infrastructure");
    }
}
