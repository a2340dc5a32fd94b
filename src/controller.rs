//! High-level controller for holon editor applications.
//!
//! The [`HolonEditorController`] owns the graph, flows, selection and tree
//! state and turns raw UI events into model mutations. Every successful
//! mutation fires the registered change listeners so the view can re-render.
//!
//! # Example
//!
//! ```ignore
//! use holon_flow_editor::{ChangeKind, ConnectOutcome, HolonEditorController};
//!
//! slint::include_modules!();
//!
//! fn main() {
//!     let window = MainWindow::new().unwrap();
//!     let ctrl = HolonEditorController::new();
//!
//!     // Click handling - the controller runs the flow-drawing state machine
//!     window.on_node_clicked(ctrl.node_clicked_callback());
//!     window.on_pane_clicked(ctrl.pane_clicked_callback());
//!     window.on_hover_changed(ctrl.hover_changed_callback());
//!
//!     window.on_toggle_flow_drawing({
//!         let ctrl = ctrl.clone();
//!         move || { ctrl.toggle_flow_drawing(); }
//!     });
//!
//!     // Re-render on change
//!     let edge_styles = std::rc::Rc::new(slint::VecModel::<EdgeView>::default());
//!     window.set_edge_styles(edge_styles.clone().into());
//!     ctrl.on_change({
//!         let ctrl = ctrl.clone();
//!         move |kind| {
//!             if kind == ChangeKind::Highlight || kind == ChangeKind::Graph {
//!                 ctrl.sync_edge_styles(&edge_styles, |id, style| EdgeView {
//!                     id,
//!                     stroke: style.stroke,
//!                     animated: style.animated,
//!                     dashed: style.dashed,
//!                 });
//!             }
//!         }
//!     });
//!
//!     window.run().unwrap();
//! }
//! ```

use crate::config::EditorConfig;
use crate::error::ImportError;
use crate::flows::{FlowCommit, FlowKey, FlowManager};
use crate::graph::{Edge, GraphStore, Node, NodeUpdate};
use crate::holon::{HolonData, HolonId, Position};
use crate::selection::{ClickOutcome, ResetTicket, SelectionController, SelectionState};
use crate::state::{EdgeStyle, HighlightPalette, NodeBorder};
use crate::tree::TreeProjection;
use crate::validation::{CompositeValidator, ValidationError};
use log::{debug, info};
use slint::{Color, Model, SharedString, TimerMode, VecModel};
use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Which part of the model a change notification is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Graph,
    Flows,
    Highlight,
    Selection,
    Tree,
}

/// Result of a node click routed through the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectOutcome {
    /// Plain selection (flow drawing is off).
    Selected(HolonId),
    /// The node is now the provisional flow source.
    SourceArmed(HolonId),
    /// A new flow was stored.
    FlowAdded(FlowKey),
    /// The pair was already stored; the connection is shown but nothing new
    /// was stored.
    Duplicate(FlowKey),
    /// The connect attempt failed validation; the source stays armed.
    /// Show the message when [`ValidationError::is_user_facing`] is true.
    Rejected(ValidationError),
    /// Unknown node, or a click on the armed source itself.
    Ignored,
}

/// Runs the delayed post-commit reset.
///
/// Scheduling again replaces any pending task.
pub trait ResetScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
    fn cancel(&self);
}

/// [`ResetScheduler`] backed by a single-shot `slint::Timer`.
///
/// Tasks only fire while the Slint event loop is running.
#[derive(Default)]
pub struct SlintTimerScheduler {
    timer: slint::Timer,
}

impl SlintTimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.timer.running()
    }
}

impl ResetScheduler for SlintTimerScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        let mut task = Some(task);
        // Restarting a running timer drops its previous callback
        self.timer.start(TimerMode::SingleShot, delay, move || {
            if let Some(task) = task.take() {
                task();
            }
        });
    }

    fn cancel(&self) {
        self.timer.stop();
    }
}

type Listener = Rc<dyn Fn(ChangeKind)>;

/// Controller that manages holon editor state and provides callback
/// implementations.
///
/// This provides a high-level API that handles:
/// - Graph CRUD with highlight and selection cleanup on removal
/// - The flow-drawing click state machine and its delayed reset
/// - Flow highlighting, listing and JSON import/export
/// - Tree-view CRUD
/// - Syncing derived styles into Slint `VecModel`s
///
/// All state lives on one thread; the controller is not `Send`.
///
/// Clone this controller to share it across callbacks.
#[derive(Clone)]
pub struct HolonEditorController {
    graph: Rc<RefCell<GraphStore>>,
    flows: Rc<RefCell<FlowManager>>,
    selection: Rc<RefCell<SelectionController>>,
    tree: Rc<RefCell<TreeProjection>>,
    listeners: Rc<RefCell<Vec<Listener>>>,
    scheduler: Rc<dyn ResetScheduler>,
    config: Rc<EditorConfig>,
}

impl Default for HolonEditorController {
    fn default() -> Self {
        Self::new()
    }
}

impl HolonEditorController {
    /// Create a controller with default settings, an empty graph and the
    /// default "Information System" tree.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self::with_scheduler(config, Rc::new(SlintTimerScheduler::new()))
    }

    /// Create a controller that runs the post-commit reset on `scheduler`.
    pub fn with_scheduler(config: EditorConfig, scheduler: Rc<dyn ResetScheduler>) -> Self {
        let config = config.sanitized();
        Self {
            graph: Rc::new(RefCell::new(GraphStore::new())),
            flows: Rc::new(RefCell::new(FlowManager::new(&config))),
            selection: Rc::new(RefCell::new(SelectionController::new())),
            tree: Rc::new(RefCell::new(TreeProjection::information_system())),
            listeners: Rc::new(RefCell::new(Vec::new())),
            scheduler,
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Register a listener fired after every successful mutation.
    pub fn on_change(&self, listener: impl Fn(ChangeKind) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Replace the connect-validation pipeline.
    pub fn set_validator(&self, validator: CompositeValidator) {
        self.flows.borrow_mut().set_validator(validator);
    }

    /// Recolor flow highlighting and endpoint borders.
    pub fn set_palette(&self, palette: HighlightPalette) {
        self.flows.borrow_mut().set_palette(palette);
        self.notify(&[ChangeKind::Highlight]);
    }

    // === Read access ===

    pub fn graph(&self) -> Ref<'_, GraphStore> {
        self.graph.borrow()
    }

    pub fn flows(&self) -> Ref<'_, FlowManager> {
        self.flows.borrow()
    }

    pub fn tree(&self) -> Ref<'_, TreeProjection> {
        self.tree.borrow()
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.borrow().state()
    }

    pub fn selected_node(&self) -> Option<HolonId> {
        self.selection.borrow().selected().map(str::to_string)
    }

    pub fn hovered_node(&self) -> Option<HolonId> {
        self.selection.borrow().hovered().map(str::to_string)
    }

    pub fn flow_drawing_enabled(&self) -> bool {
        self.selection.borrow().drawing_enabled()
    }

    // === Graph CRUD ===

    /// Replace the whole graph. Flows are kept; highlighting and selection
    /// are cleared.
    pub fn set_graph(&self, graph: GraphStore) {
        *self.graph.borrow_mut() = graph;
        self.flows.borrow_mut().reset();
        self.selection.borrow_mut().pane_click();
        self.scheduler.cancel();
        self.notify(&[ChangeKind::Graph, ChangeKind::Highlight, ChangeKind::Selection]);
    }

    pub fn add_node(&self, label: impl Into<String>, position: Position) -> Node {
        let node = self.graph.borrow_mut().add_node(label, position);
        self.notify(&[ChangeKind::Graph]);
        node
    }

    pub fn add_child_node(&self, parent_id: &str, label: impl Into<String>, position: Position) -> Option<Node> {
        let node = self.graph.borrow_mut().add_child_node(parent_id, label, position)?;
        self.notify(&[ChangeKind::Graph]);
        Some(node)
    }

    pub fn add_parent_node(&self, child_id: &str, label: impl Into<String>, position: Position) -> Option<Node> {
        let node = self.graph.borrow_mut().add_parent_node(child_id, label, position)?;
        self.notify(&[ChangeKind::Graph]);
        Some(node)
    }

    /// Remove a node, its incident edges and any decoration pointing at them.
    ///
    /// Stored flows touching the node are kept and fall back to their
    /// snapshots.
    pub fn remove_node(&self, id: &str) -> bool {
        let removed_edges: Vec<String> = {
            let mut graph = self.graph.borrow_mut();
            let incident = graph.incident_edges(id).map(|e| e.id.clone()).collect();
            if !graph.remove_node(id) {
                return false;
            }
            incident
        };
        {
            let mut flows = self.flows.borrow_mut();
            let overlay = flows.overlay_mut();
            overlay.forget_node(id);
            for edge_id in &removed_edges {
                overlay.forget_edge(edge_id);
            }
        }
        self.selection.borrow_mut().forget(id);
        self.notify(&[ChangeKind::Graph, ChangeKind::Highlight, ChangeKind::Selection]);
        true
    }

    pub fn update_node(&self, id: &str, update: NodeUpdate) -> bool {
        if !self.graph.borrow_mut().update_node(id, update) {
            return false;
        }
        // Flow listings resolve labels against live nodes
        self.notify(&[ChangeKind::Graph, ChangeKind::Flows]);
        true
    }

    pub fn set_node_position(&self, id: &str, position: Position) -> bool {
        if !self.graph.borrow_mut().set_position(id, position) {
            return false;
        }
        self.notify(&[ChangeKind::Graph]);
        true
    }

    pub fn add_edge(&self, source_id: &str, target_id: &str) -> Option<Edge> {
        let edge = self.graph.borrow_mut().add_edge(source_id, target_id)?;
        self.notify(&[ChangeKind::Graph]);
        Some(edge)
    }

    pub fn remove_edge(&self, id: &str) -> bool {
        if !self.graph.borrow_mut().remove_edge(id) {
            return false;
        }
        self.flows.borrow_mut().overlay_mut().forget_edge(id);
        self.notify(&[ChangeKind::Graph, ChangeKind::Highlight]);
        true
    }

    // === Flow drawing ===

    /// Turn flow drawing on or off. Returns `true` if the mode changed.
    ///
    /// Turning it off clears provisional decoration and cancels a pending
    /// reset; stored flows and sticky highlights are untouched.
    pub fn set_flow_drawing(&self, enabled: bool) -> bool {
        if !self.selection.borrow_mut().set_drawing_enabled(enabled) {
            return false;
        }
        if !enabled {
            self.flows.borrow_mut().clear_provisional();
            self.scheduler.cancel();
        }
        debug!("controller: flow drawing {}", if enabled { "on" } else { "off" });
        self.notify(&[ChangeKind::Selection, ChangeKind::Highlight]);
        true
    }

    /// Flip flow drawing and return the new mode.
    pub fn toggle_flow_drawing(&self) -> bool {
        let enabled = !self.flow_drawing_enabled();
        self.set_flow_drawing(enabled);
        enabled
    }

    /// Route a node click through the flow-drawing state machine.
    pub fn handle_node_click(&self, node_id: &str) -> ConnectOutcome {
        if !self.graph.borrow().contains(node_id) {
            return ConnectOutcome::Ignored;
        }

        let click = self.selection.borrow_mut().click(node_id);
        match click {
            ClickOutcome::Selected(id) => {
                self.notify(&[ChangeKind::Selection]);
                ConnectOutcome::Selected(id)
            }
            ClickOutcome::SourceArmed(id) => {
                self.scheduler.cancel();
                self.flows.borrow_mut().mark_provisional_source(&id);
                self.notify(&[ChangeKind::Selection, ChangeKind::Highlight]);
                ConnectOutcome::SourceArmed(id)
            }
            ClickOutcome::Ignored => ConnectOutcome::Ignored,
            ClickOutcome::ConnectRequested { source, destination } => {
                self.connect(&source, &destination)
            }
        }
    }

    fn connect(&self, source: &str, destination: &str) -> ConnectOutcome {
        let result = {
            let graph = self.graph.borrow();
            self.flows.borrow_mut().add_flow(&graph, source, destination)
        };

        match result {
            Ok(commit) => {
                let ticket = self.selection.borrow_mut().commit();
                self.schedule_reset(ticket);
                match commit {
                    FlowCommit::Added(key) => {
                        self.notify(&[ChangeKind::Flows, ChangeKind::Highlight, ChangeKind::Selection]);
                        ConnectOutcome::FlowAdded(key)
                    }
                    FlowCommit::Duplicate(key) => {
                        self.notify(&[ChangeKind::Highlight, ChangeKind::Selection]);
                        ConnectOutcome::Duplicate(key)
                    }
                }
            }
            Err(err) => {
                self.selection.borrow_mut().reject();
                if err.is_user_facing() {
                    info!("controller: connect {} -> {} refused: {}", source, destination, err);
                }
                self.notify(&[ChangeKind::Selection]);
                ConnectOutcome::Rejected(err)
            }
        }
    }

    /// A click on empty canvas clears selection and provisional decoration.
    pub fn handle_pane_click(&self) {
        self.selection.borrow_mut().pane_click();
        self.flows.borrow_mut().clear_provisional();
        self.scheduler.cancel();
        self.notify(&[ChangeKind::Selection, ChangeKind::Highlight]);
    }

    /// Track the hovered node. Returns `true` if it changed.
    pub fn handle_hover(&self, node_id: Option<&str>) -> bool {
        if !self.selection.borrow_mut().hover(node_id) {
            return false;
        }
        self.notify(&[ChangeKind::Selection]);
        true
    }

    /// Ticket for the current selection generation.
    ///
    /// Taken right after a commit, it can be handed to
    /// [`apply_reset`](Self::apply_reset) by hosts that drive the reset
    /// themselves.
    pub fn current_ticket(&self) -> ResetTicket {
        self.selection.borrow().ticket()
    }

    /// Clear the provisional decoration of a committed connection.
    ///
    /// Called by the scheduled reset; a stale `ticket` (issued before a later
    /// mode change, click or pane click) is ignored and returns `false`.
    pub fn apply_reset(&self, ticket: ResetTicket) -> bool {
        if !redeem_ticket(&self.selection, &self.flows, ticket) {
            debug!("controller: stale reset ticket {}", ticket.generation());
            return false;
        }
        notify_listeners(&self.listeners, &[ChangeKind::Selection, ChangeKind::Highlight]);
        true
    }

    fn schedule_reset(&self, ticket: ResetTicket) {
        let selection = Rc::downgrade(&self.selection);
        let flows = Rc::downgrade(&self.flows);
        let listeners = Rc::downgrade(&self.listeners);
        self.scheduler.schedule(
            self.config.reset_delay(),
            Box::new(move || {
                let (Some(selection), Some(flows), Some(listeners)) =
                    (Weak::upgrade(&selection), Weak::upgrade(&flows), Weak::upgrade(&listeners))
                else {
                    return;
                };
                if redeem_ticket(&selection, &flows, ticket) {
                    notify_listeners(&listeners, &[ChangeKind::Selection, ChangeKind::Highlight]);
                }
            }),
        );
    }

    // === Flows ===

    /// Validate and store a flow directly, bypassing the click state machine.
    ///
    /// A successful commit is decorated and reset after the configured delay,
    /// the same as one drawn by clicking.
    pub fn add_flow(&self, source_id: &str, destination_id: &str) -> Result<FlowCommit, ValidationError> {
        let commit = {
            let graph = self.graph.borrow();
            self.flows.borrow_mut().add_flow(&graph, source_id, destination_id)?
        };
        let ticket = self.selection.borrow_mut().commit();
        self.schedule_reset(ticket);
        if matches!(commit, FlowCommit::Added(_)) {
            self.notify(&[ChangeKind::Flows, ChangeKind::Highlight, ChangeKind::Selection]);
        } else {
            self.notify(&[ChangeKind::Highlight, ChangeKind::Selection]);
        }
        Ok(commit)
    }

    pub fn remove_flow(&self, source_id: &str, destination_id: &str) -> bool {
        if !self.flows.borrow_mut().remove(source_id, destination_id) {
            return false;
        }
        self.notify(&[ChangeKind::Flows, ChangeKind::Highlight]);
        true
    }

    pub fn show_all_flows(&self) -> usize {
        let shown = {
            let graph = self.graph.borrow();
            self.flows.borrow_mut().show_all(&graph)
        };
        self.notify(&[ChangeKind::Highlight]);
        shown
    }

    pub fn show_flows_for_node(&self, node_id: &str) -> usize {
        let shown = {
            let graph = self.graph.borrow();
            self.flows.borrow_mut().show_for_node(&graph, node_id)
        };
        self.notify(&[ChangeKind::Highlight]);
        shown
    }

    /// Show the flows touching the currently selected node, if any.
    pub fn show_flows_for_selected(&self) -> usize {
        match self.selected_node() {
            Some(id) => self.show_flows_for_node(&id),
            None => 0,
        }
    }

    pub fn show_flow(&self, source_id: &str, destination_id: &str) -> bool {
        let found = {
            let graph = self.graph.borrow();
            self.flows.borrow_mut().show_one(&graph, source_id, destination_id)
        };
        self.notify(&[ChangeKind::Highlight]);
        found
    }

    /// Clear all highlighting. Stored flows are untouched.
    pub fn reset_highlight(&self) {
        self.flows.borrow_mut().reset();
        self.scheduler.cancel();
        self.notify(&[ChangeKind::Highlight]);
    }

    pub fn flow_labels(&self) -> Vec<String> {
        let graph = self.graph.borrow();
        self.flows.borrow().flow_labels(&graph)
    }

    pub fn flow_keys(&self) -> Vec<FlowKey> {
        self.flows.borrow().flows().iter().map(|f| f.key()).collect()
    }

    pub fn export_flows(&self) -> Result<String, serde_json::Error> {
        let graph = self.graph.borrow();
        self.flows.borrow().export_json(&graph)
    }

    /// Replace the stored flows from JSON. On error nothing changes and the
    /// error's message is suitable for the user.
    pub fn import_flows(&self, json: &str) -> Result<usize, ImportError> {
        let count = {
            let graph = self.graph.borrow();
            self.flows.borrow_mut().import_json(&graph, json)?
        };
        self.notify(&[ChangeKind::Flows]);
        Ok(count)
    }

    // === Tree ===

    pub fn set_tree(&self, tree: TreeProjection) {
        *self.tree.borrow_mut() = tree;
        self.notify(&[ChangeKind::Tree]);
    }

    pub fn tree_add_child(&self, parent_id: &str, label: impl Into<String>) -> Option<HolonId> {
        let id = self.tree.borrow_mut().new_child(parent_id, label)?;
        self.notify(&[ChangeKind::Tree]);
        Some(id)
    }

    pub fn tree_add_parent(&self, label: impl Into<String>) -> HolonId {
        let id = self.tree.borrow_mut().add_parent(label);
        self.notify(&[ChangeKind::Tree]);
        id
    }

    pub fn tree_remove_node(&self, id: &str) -> bool {
        if !self.tree.borrow_mut().remove_node(id) {
            return false;
        }
        self.notify(&[ChangeKind::Tree]);
        true
    }

    pub fn tree_update(&self, id: &str, data: HolonData) -> bool {
        if !self.tree.borrow_mut().update(id, data) {
            return false;
        }
        self.notify(&[ChangeKind::Tree]);
        true
    }

    // === Derived view state ===

    pub fn edge_style(&self, edge_id: &str) -> EdgeStyle {
        self.flows.borrow().overlay().edge_style(edge_id)
    }

    pub fn node_border(&self, node_id: &str) -> NodeBorder {
        self.flows.borrow().overlay().node_border(node_id)
    }

    pub fn node_border_color(&self, node_id: &str) -> Option<Color> {
        let flows = self.flows.borrow();
        let overlay = flows.overlay();
        overlay.palette().border_color(overlay.node_border(node_id))
    }

    /// Update `model` in place with one row per graph edge, in edge order.
    ///
    /// The constructor builds the Slint row type from (edge id, style).
    pub fn sync_edge_styles<P, F>(&self, model: &VecModel<P>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, EdgeStyle) -> P,
    {
        let graph = self.graph.borrow();
        let flows = self.flows.borrow();
        let rows = graph
            .edges()
            .iter()
            .map(|e| constructor(SharedString::from(e.id.as_str()), flows.overlay().edge_style(&e.id)));
        sync_rows(model, rows);
    }

    /// Update `model` in place with one row per stored flow.
    ///
    /// The constructor builds the Slint row type from
    /// (source id, destination id, "Source --> Destination" label).
    pub fn sync_flow_list<P, F>(&self, model: &VecModel<P>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, SharedString, SharedString) -> P,
    {
        let graph = self.graph.borrow();
        let flows = self.flows.borrow();
        let rows = flows
            .flows()
            .iter()
            .zip(flows.flow_labels(&graph))
            .map(|(flow, label)| {
                constructor(
                    SharedString::from(flow.source.id()),
                    SharedString::from(flow.destination.id()),
                    SharedString::from(label),
                )
            });
        sync_rows(model, rows);
    }

    // === Callback factories ===

    /// Returns a callback for `node-clicked(id)`.
    pub fn node_clicked_callback(&self) -> impl Fn(SharedString) {
        let ctrl = self.clone();
        move |id| {
            ctrl.handle_node_click(id.as_str());
        }
    }

    /// Returns a callback for `pane-clicked()`.
    pub fn pane_clicked_callback(&self) -> impl Fn() {
        let ctrl = self.clone();
        move || ctrl.handle_pane_click()
    }

    /// Returns a callback for `hover-changed(id)`. An empty id means no node
    /// is hovered.
    pub fn hover_changed_callback(&self) -> impl Fn(SharedString) {
        let ctrl = self.clone();
        move |id| {
            let id = (!id.is_empty()).then_some(id.as_str());
            ctrl.handle_hover(id);
        }
    }

    fn notify(&self, kinds: &[ChangeKind]) {
        notify_listeners(&self.listeners, kinds);
    }
}

fn redeem_ticket(
    selection: &RefCell<SelectionController>,
    flows: &RefCell<FlowManager>,
    ticket: ResetTicket,
) -> bool {
    if !selection.borrow_mut().finish_reset(ticket) {
        return false;
    }
    flows.borrow_mut().clear_provisional();
    true
}

/// Fire listeners without holding the registry borrow, so a listener may
/// register another one.
fn notify_listeners(listeners: &RefCell<Vec<Listener>>, kinds: &[ChangeKind]) {
    let snapshot: Vec<Listener> = listeners.borrow().clone();
    for &kind in kinds {
        for listener in &snapshot {
            listener(kind);
        }
    }
}

fn sync_rows<P, I>(model: &VecModel<P>, rows: I)
where
    P: Clone + 'static,
    I: IntoIterator<Item = P>,
{
    let mut count = 0;
    for (i, row) in rows.into_iter().enumerate() {
        if i < model.row_count() {
            model.set_row_data(i, row);
        } else {
            model.push(row);
        }
        count = i + 1;
    }
    while model.row_count() > count {
        model.remove(model.row_count() - 1);
    }
}
