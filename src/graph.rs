use crate::holon::{Holon, HolonData, HolonId, Position};
use log::debug;
use serde::{Deserialize, Serialize};

/// A holon placed in the free-form graph view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub holon: Holon,
    #[serde(default)]
    pub position: Position,
}

impl Node {
    pub fn new(id: impl Into<HolonId>, label: impl Into<String>, position: Position) -> Self {
        Self {
            holon: Holon::new(id, label),
            position,
        }
    }

    pub fn id(&self) -> &str {
        &self.holon.id
    }

    pub fn label(&self) -> &str {
        self.holon.label()
    }

    pub fn description(&self) -> Option<&str> {
        self.holon.description()
    }
}

/// A connection between two graph nodes.
///
/// Edges are directed when created but path finding walks them in both
/// directions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: HolonId,
    pub target: HolonId,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<HolonId>, target: impl Into<HolonId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// True if either endpoint is `node_id`.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// The endpoint opposite to `node_id`, if the edge touches it.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Partial edit of a node's data. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeUpdate {
    pub label: Option<String>,
    pub description: Option<String>,
}

impl NodeUpdate {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            description: None,
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            label: None,
            description: Some(description.into()),
        }
    }

    fn apply(self, data: &mut HolonData) {
        if let Some(label) = self.label {
            data.label = label;
        }
        if let Some(description) = self.description {
            data.description = Some(description);
        }
    }
}

/// Owns the node and edge sets of the graph view.
///
/// Removal and update of unknown ids are silent no-ops; the boolean results
/// only report whether anything changed so callers know when to notify the
/// view.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    next_node: u64,
    next_edge: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from pre-existing nodes and edges.
    ///
    /// Edges whose endpoints are missing are dropped.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            store.insert_node(node);
        }
        for edge in edges {
            store.insert_edge(edge);
        }
        store
    }

    /// Add a node with a freshly generated id.
    pub fn add_node(&mut self, label: impl Into<String>, position: Position) -> Node {
        let id = self.fresh_node_id();
        let node = Node::new(id, label, position);
        debug!("graph: add node {} ({})", node.id(), node.label());
        self.nodes.push(node.clone());
        node
    }

    /// Insert a node with a caller-chosen id, replacing any node with the same id.
    pub fn insert_node(&mut self, node: Node) {
        match self.nodes.iter_mut().find(|n| n.id() == node.id()) {
            Some(existing) => *existing = node,
            None => self.nodes.push(node),
        }
    }

    /// Add a node plus an edge from `parent_id` to it.
    pub fn add_child_node(
        &mut self,
        parent_id: &str,
        label: impl Into<String>,
        position: Position,
    ) -> Option<Node> {
        if !self.contains(parent_id) {
            return None;
        }
        let node = self.add_node(label, position);
        self.add_edge(parent_id, node.id());
        Some(node)
    }

    /// Add a node plus an edge from it to `child_id`.
    pub fn add_parent_node(
        &mut self,
        child_id: &str,
        label: impl Into<String>,
        position: Position,
    ) -> Option<Node> {
        if !self.contains(child_id) {
            return None;
        }
        let node = self.add_node(label, position);
        self.add_edge(node.id(), child_id);
        Some(node)
    }

    /// Remove a node and every edge incident to it.
    ///
    /// Returns `false` (and changes nothing) if the node does not exist.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let len_before = self.nodes.len();
        self.nodes.retain(|n| n.id() != id);
        if self.nodes.len() == len_before {
            return false;
        }
        let edges_before = self.edges.len();
        self.edges.retain(|e| !e.touches(id));
        debug!(
            "graph: removed node {} and {} incident edge(s)",
            id,
            edges_before - self.edges.len()
        );
        true
    }

    /// Merge label/description changes into a node.
    pub fn update_node(&mut self, id: &str, update: NodeUpdate) -> bool {
        match self.nodes.iter_mut().find(|n| n.id() == id) {
            Some(node) => {
                update.apply(&mut node.holon.data);
                true
            }
            None => false,
        }
    }

    pub fn set_position(&mut self, id: &str, position: Position) -> bool {
        match self.nodes.iter_mut().find(|n| n.id() == id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Append an edge between two existing nodes.
    ///
    /// Duplicate pairs are allowed. Returns `None` if either endpoint is missing.
    pub fn add_edge(&mut self, source_id: &str, target_id: &str) -> Option<Edge> {
        if !self.contains(source_id) || !self.contains(target_id) {
            debug!("graph: rejected edge {} -> {}: missing endpoint", source_id, target_id);
            return None;
        }
        let edge = Edge::new(self.fresh_edge_id(), source_id, target_id);
        self.edges.push(edge.clone());
        Some(edge)
    }

    /// Insert an edge with a caller-chosen id.
    ///
    /// Rejected if an endpoint is missing or the id is already taken.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        if !self.contains(&edge.source) || !self.contains(&edge.target) {
            return false;
        }
        if self.edge(&edge.id).is_some() {
            debug!("graph: rejected edge {}: id already taken", edge.id);
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let len_before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != len_before
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges with `node_id` as either endpoint.
    pub fn incident_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    /// Nodes that are not the target of any edge.
    pub fn root_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn fresh_node_id(&mut self) -> HolonId {
        loop {
            self.next_node += 1;
            let id = format!("node-{}", self.next_node);
            if !self.contains(&id) {
                return id;
            }
        }
    }

    fn fresh_edge_id(&mut self) -> String {
        loop {
            self.next_edge += 1;
            let id = format!("edge-{}", self.next_edge);
            if self.edge(&id).is_none() {
                return id;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
