//! Information-flow management for the graph view.
//!
//! [`FlowManager`] owns the ordered list of directed information flows,
//! validates connect attempts, keeps the highlight overlay in step with the
//! flows being shown, and converts flows to and from the flat JSON exchange
//! format.
//!
//! # Example
//!
//! ```ignore
//! use holon_flow_editor::{EditorConfig, FlowManager, GraphStore};
//!
//! let config = EditorConfig::default();
//! let mut flows = FlowManager::new(&config);
//!
//! match flows.add_flow(&graph, "2", "3") {
//!     Ok(commit) => println!("stored {:?}", commit),
//!     Err(err) if err.is_user_facing() => show_alert(&err.to_string()),
//!     Err(_) => {}
//! }
//!
//! flows.show_all(&graph);
//! let style = flows.overlay().edge_style("e1-2");
//! ```

use crate::config::{EditorConfig, PathMembership};
use crate::error::ImportError;
use crate::graph::{GraphStore, Node};
use crate::holon::{HolonData, HolonId, Position};
use crate::path::find_path;
use crate::state::{EdgeStyle, HighlightOverlay, HighlightPalette, NodeBorder, OverlayLayer};
use crate::validation::{CompositeValidator, FlowValidator, ValidationError, ValidationResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Serialized form of a flow endpoint.
///
/// Fields other than `id`, `data` and `position` are carried through
/// untouched so that an import/export round trip preserves them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: HolonId,
    pub data: HolonData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeSnapshot {
    pub fn new(id: impl Into<HolonId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: HolonData::new(label),
            position: None,
            extra: Map::new(),
        }
    }
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        Self {
            id: node.holon.id.clone(),
            data: node.holon.data.clone(),
            position: Some(node.position),
            extra: Map::new(),
        }
    }
}

/// One end of an information flow.
///
/// A live endpoint follows the graph node with the same id, so later label
/// and description edits show up in listings and exports. A detached
/// endpoint is an imported snapshot with no matching node; it is kept as-is.
/// A live endpoint whose node has since been deleted falls back to the
/// snapshot taken when it was linked.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowEndpoint {
    snapshot: NodeSnapshot,
    live: bool,
}

impl FlowEndpoint {
    pub fn live(node: &Node) -> Self {
        Self {
            snapshot: NodeSnapshot::from(node),
            live: true,
        }
    }

    pub fn detached(snapshot: NodeSnapshot) -> Self {
        Self {
            snapshot,
            live: false,
        }
    }

    /// Link `snapshot` to the matching live node if there is one.
    pub fn reconcile(snapshot: NodeSnapshot, graph: &GraphStore) -> Self {
        match graph.node(&snapshot.id) {
            Some(node) => {
                let extra = snapshot.extra;
                let mut endpoint = Self::live(node);
                endpoint.snapshot.extra = extra;
                endpoint
            }
            None => Self::detached(snapshot),
        }
    }

    pub fn id(&self) -> &str {
        &self.snapshot.id
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Current snapshot: the live node's data when linked and present.
    pub fn resolve(&self, graph: &GraphStore) -> NodeSnapshot {
        match self.live_node(graph) {
            Some(node) => NodeSnapshot {
                extra: self.snapshot.extra.clone(),
                ..NodeSnapshot::from(node)
            },
            None => self.snapshot.clone(),
        }
    }

    pub fn label<'a>(&'a self, graph: &'a GraphStore) -> &'a str {
        match self.live_node(graph) {
            Some(node) => node.label(),
            None => &self.snapshot.data.label,
        }
    }

    fn live_node<'a>(&self, graph: &'a GraphStore) -> Option<&'a Node> {
        if self.live {
            graph.node(&self.snapshot.id)
        } else {
            None
        }
    }
}

/// Ordered (source, destination) pair identifying a flow.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub source: HolonId,
    pub destination: HolonId,
}

impl FlowKey {
    pub fn new(source: impl Into<HolonId>, destination: impl Into<HolonId>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// A directed communication relationship between two holons.
#[derive(Clone, Debug, PartialEq)]
pub struct InformationFlow {
    pub source: FlowEndpoint,
    pub destination: FlowEndpoint,
}

impl InformationFlow {
    pub fn new(source: FlowEndpoint, destination: FlowEndpoint) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub fn key(&self) -> FlowKey {
        FlowKey::new(self.source.id(), self.destination.id())
    }

    pub fn connects(&self, source_id: &str, destination_id: &str) -> bool {
        self.source.id() == source_id && self.destination.id() == destination_id
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source.id() == node_id || self.destination.id() == node_id
    }
}

/// Outcome of a connect attempt that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowCommit {
    /// A new flow was stored.
    Added(FlowKey),
    /// The pair was already stored; nothing new was stored but the
    /// connection is still shown.
    Duplicate(FlowKey),
}

impl FlowCommit {
    pub fn key(&self) -> &FlowKey {
        match self {
            FlowCommit::Added(key) | FlowCommit::Duplicate(key) => key,
        }
    }
}

/// Manages information flows and their highlight overlay.
pub struct FlowManager {
    flows: Vec<InformationFlow>,
    /// node id → keys of the flows touching it
    by_node: HashMap<HolonId, Vec<FlowKey>>,
    overlay: HighlightOverlay,
    validator: CompositeValidator,
    membership: PathMembership,
}

impl Default for FlowManager {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl FlowManager {
    pub fn new(config: &EditorConfig) -> Self {
        let config = config.clone().sanitized();
        Self {
            flows: Vec::new(),
            by_node: HashMap::new(),
            overlay: HighlightOverlay::new(),
            validator: CompositeValidator::standard(config.level_tolerance),
            membership: config.path_membership,
        }
    }

    /// Replace the connect-validation pipeline.
    pub fn set_validator(&mut self, validator: CompositeValidator) {
        self.validator = validator;
    }

    pub fn set_palette(&mut self, palette: HighlightPalette) {
        self.overlay.set_palette(palette);
    }

    pub fn overlay(&self) -> &HighlightOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut HighlightOverlay {
        &mut self.overlay
    }

    pub fn flows(&self) -> &[InformationFlow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn contains(&self, source_id: &str, destination_id: &str) -> bool {
        self.find(source_id, destination_id).is_some()
    }

    pub fn find(&self, source_id: &str, destination_id: &str) -> Option<&InformationFlow> {
        self.flows.iter().find(|f| f.connects(source_id, destination_id))
    }

    /// Validate and store `source_id → destination_id`.
    ///
    /// On success (including the silent duplicate case) the connection path
    /// and both endpoints are decorated in the provisional layer. On failure
    /// nothing changes; use [`ValidationError::is_user_facing`] to decide
    /// whether to surface the error.
    pub fn add_flow(
        &mut self,
        graph: &GraphStore,
        source_id: &str,
        destination_id: &str,
    ) -> Result<FlowCommit, ValidationError> {
        let key = FlowKey::new(source_id, destination_id);
        let commit = match self.validator.validate(source_id, destination_id, graph, &self.flows) {
            ValidationResult::Valid if self.contains(source_id, destination_id) => {
                debug!("flows: {} -> {} already stored", source_id, destination_id);
                FlowCommit::Duplicate(key)
            }
            ValidationResult::Valid => {
                // Validation guarantees both nodes exist
                let (Some(source), Some(destination)) =
                    (graph.node(source_id), graph.node(destination_id))
                else {
                    return Err(ValidationError::NodeNotFound(source_id.to_string()));
                };
                self.flows.push(InformationFlow::new(
                    FlowEndpoint::live(source),
                    FlowEndpoint::live(destination),
                ));
                self.index(&key);
                info!("flows: added {} -> {}", source_id, destination_id);
                FlowCommit::Added(key)
            }
            ValidationResult::Invalid(ValidationError::DuplicateFlow) => {
                debug!("flows: {} -> {} already stored", source_id, destination_id);
                FlowCommit::Duplicate(key)
            }
            ValidationResult::Invalid(err) => {
                debug!("flows: rejected {} -> {}: {}", source_id, destination_id, err);
                return Err(err);
            }
        };

        let path = find_path(graph.edges(), source_id, destination_id);
        self.overlay
            .mark_path(graph.edges(), &path, self.membership, OverlayLayer::Provisional);
        self.overlay
            .set_border(source_id, NodeBorder::Source, OverlayLayer::Provisional);
        self.overlay
            .set_border(destination_id, NodeBorder::Destination, OverlayLayer::Provisional);
        Ok(commit)
    }

    /// Decorate the provisional flow source while a destination is chosen.
    pub fn mark_provisional_source(&mut self, node_id: &str) {
        self.overlay.clear_provisional();
        self.overlay
            .set_border(node_id, NodeBorder::Source, OverlayLayer::Provisional);
    }

    pub fn clear_provisional(&mut self) {
        self.overlay.clear_provisional();
    }

    /// Add the edges of `path` to the sticky highlight.
    ///
    /// Highlighting accumulates: edges marked earlier stay marked until
    /// [`reset`](Self::reset). Returns the resulting style of every edge in
    /// graph order.
    pub fn highlight_path(
        &mut self,
        graph: &GraphStore,
        path: &[HolonId],
    ) -> Vec<(String, EdgeStyle)> {
        self.overlay
            .mark_path(graph.edges(), path, self.membership, OverlayLayer::Sticky);
        graph
            .edges()
            .iter()
            .map(|e| (e.id.clone(), self.overlay.edge_style(&e.id)))
            .collect()
    }

    /// Highlight one flow's path and decorate its endpoints.
    ///
    /// Returns `false` when the endpoints are not connected; the endpoint
    /// borders are still drawn in that case.
    pub fn show_one(&mut self, graph: &GraphStore, source_id: &str, destination_id: &str) -> bool {
        self.overlay
            .set_border(source_id, NodeBorder::Source, OverlayLayer::Sticky);
        self.overlay
            .set_border(destination_id, NodeBorder::Destination, OverlayLayer::Sticky);

        let path = find_path(graph.edges(), source_id, destination_id);
        if path.is_empty() {
            warn!(
                "flows: no path found between {} and {}",
                source_id, destination_id
            );
            return false;
        }
        self.highlight_path(graph, &path);
        true
    }

    /// Highlight every stored flow at once. Returns how many had a path.
    pub fn show_all(&mut self, graph: &GraphStore) -> usize {
        let keys: Vec<FlowKey> = self.flows.iter().map(InformationFlow::key).collect();
        keys.iter()
            .filter(|k| self.show_one(graph, &k.source, &k.destination))
            .count()
    }

    /// Reset, then highlight only the flows touching `node_id`.
    ///
    /// Returns how many flows were shown.
    pub fn show_for_node(&mut self, graph: &GraphStore, node_id: &str) -> usize {
        self.reset();
        let keys = self.by_node.get(node_id).cloned().unwrap_or_default();
        for key in &keys {
            self.show_one(graph, &key.source, &key.destination);
        }
        keys.len()
    }

    /// Flows with `node_id` as source or destination, in stored order.
    pub fn flows_for_node(&self, node_id: &str) -> Vec<&InformationFlow> {
        self.flows.iter().filter(|f| f.touches(node_id)).collect()
    }

    /// Delete a stored flow and clear all highlighting.
    pub fn remove(&mut self, source_id: &str, destination_id: &str) -> bool {
        let len_before = self.flows.len();
        self.flows.retain(|f| !f.connects(source_id, destination_id));
        if self.flows.len() == len_before {
            return false;
        }
        self.rebuild_index();
        self.reset();
        info!("flows: removed {} -> {}", source_id, destination_id);
        true
    }

    /// Clear all highlight style back to neutral. Stored flows are untouched.
    pub fn reset(&mut self) {
        self.overlay.reset();
    }

    /// `"Source --> Destination"` lines for the flow listing.
    pub fn flow_labels(&self, graph: &GraphStore) -> Vec<String> {
        self.flows
            .iter()
            .map(|f| format!("{} --> {}", f.source.label(graph), f.destination.label(graph)))
            .collect()
    }

    /// Current flows as `[source, destination]` snapshot pairs.
    pub fn export(&self, graph: &GraphStore) -> Vec<[NodeSnapshot; 2]> {
        self.flows
            .iter()
            .map(|f| [f.source.resolve(graph), f.destination.resolve(graph)])
            .collect()
    }

    pub fn export_json(&self, graph: &GraphStore) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(&self.export(graph))?;
        info!("flows: exported {} flow(s)", self.flows.len());
        Ok(json)
    }

    /// Replace the stored flows with `pairs`.
    ///
    /// Each snapshot is linked to the live node with the same id when one
    /// exists. Repeated ordered pairs are dropped (first wins). Returns the
    /// number of flows stored.
    pub fn import<I>(&mut self, graph: &GraphStore, pairs: I) -> usize
    where
        I: IntoIterator<Item = (NodeSnapshot, NodeSnapshot)>,
    {
        let mut seen: HashSet<FlowKey> = HashSet::new();
        let mut flows = Vec::new();
        for (source, destination) in pairs {
            let flow = InformationFlow::new(
                FlowEndpoint::reconcile(source, graph),
                FlowEndpoint::reconcile(destination, graph),
            );
            if seen.insert(flow.key()) {
                flows.push(flow);
            } else {
                debug!("flows: dropped repeated import entry {:?}", flow.key());
            }
        }

        self.flows = flows;
        self.rebuild_index();
        self.flows.len()
    }

    /// Parse and import the JSON exchange format.
    ///
    /// The whole document is parsed and checked before anything is replaced;
    /// on error the stored flows are untouched.
    pub fn import_json(&mut self, graph: &GraphStore, json: &str) -> Result<usize, ImportError> {
        let pairs = parse_flow_pairs(json).map_err(|err| {
            warn!("flows: import discarded: {}", err);
            err
        })?;
        let count = self.import(graph, pairs);
        info!("flows: imported {} flow(s)", count);
        Ok(count)
    }

    fn index(&mut self, key: &FlowKey) {
        self.by_node
            .entry(key.source.clone())
            .or_default()
            .push(key.clone());
        if key.destination != key.source {
            self.by_node
                .entry(key.destination.clone())
                .or_default()
                .push(key.clone());
        }
    }

    fn rebuild_index(&mut self) {
        self.by_node.clear();
        let keys: Vec<FlowKey> = self.flows.iter().map(InformationFlow::key).collect();
        for key in &keys {
            self.index(key);
        }
    }
}

/// Parse the exchange format into snapshot pairs without touching any state.
fn parse_flow_pairs(json: &str) -> Result<Vec<(NodeSnapshot, NodeSnapshot)>, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = value else {
        return Err(ImportError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).map_err(|e| ImportError::InvalidEntry {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
