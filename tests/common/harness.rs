//! Test harness wiring a controller the way a Slint host would.
//!
//! The view rows below stand in for the structs `slint::include_modules!()`
//! would generate; the harness keeps them in `VecModel`s refreshed from the
//! change notifications.

#![allow(dead_code)]

use super::{three_holon_graph, CallbackTracker, ManualScheduler};
use holon_flow_editor::{ChangeKind, EditorConfig, GraphStore, HolonEditorController};
use slint::{Color, Model, SharedString, VecModel};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRow {
    pub id: SharedString,
    pub animated: bool,
    pub stroke: Color,
    pub dashed: bool,
    pub has_arrow: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowRow {
    pub source: SharedString,
    pub destination: SharedString,
    pub label: SharedString,
}

pub struct EditorHarness {
    pub ctrl: HolonEditorController,
    pub scheduler: Rc<ManualScheduler>,
    pub tracker: CallbackTracker,
    pub edges: Rc<VecModel<EdgeRow>>,
    pub flows: Rc<VecModel<FlowRow>>,
}

impl EditorHarness {
    /// Harness over the three-holon fixture with default configuration.
    pub fn new() -> Self {
        Self::with_graph(three_holon_graph(), EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self::with_graph(three_holon_graph(), config)
    }

    pub fn with_graph(graph: GraphStore, config: EditorConfig) -> Self {
        let scheduler = ManualScheduler::new();
        let ctrl = HolonEditorController::with_scheduler(config, scheduler.clone());
        ctrl.set_graph(graph);

        let tracker = CallbackTracker::new();
        let edges = Rc::new(VecModel::<EdgeRow>::default());
        let flows = Rc::new(VecModel::<FlowRow>::default());

        ctrl.on_change({
            let tracker = tracker.clone();
            move |kind| tracker.record(kind)
        });
        ctrl.on_change({
            let ctrl = ctrl.clone();
            let edges = edges.clone();
            let flows = flows.clone();
            move |kind| match kind {
                ChangeKind::Graph | ChangeKind::Highlight => {
                    ctrl.sync_edge_styles(&edges, |id, style| EdgeRow {
                        id,
                        animated: style.animated,
                        stroke: style.stroke,
                        dashed: style.dashed,
                        has_arrow: style.marker.is_some(),
                    });
                }
                ChangeKind::Flows => {
                    ctrl.sync_flow_list(&flows, |source, destination, label| FlowRow {
                        source,
                        destination,
                        label,
                    });
                }
                _ => {}
            }
        });

        // Initial render
        ctrl.sync_edge_styles(&edges, |id, style| EdgeRow {
            id,
            animated: style.animated,
            stroke: style.stroke,
            dashed: style.dashed,
            has_arrow: style.marker.is_some(),
        });

        Self {
            ctrl,
            scheduler,
            tracker,
            edges,
            flows,
        }
    }

    /// Click each node in turn, as the user would.
    pub fn click(&self, ids: &[&str]) {
        for id in ids {
            self.ctrl.handle_node_click(id);
        }
    }

    /// Turn flow drawing on and connect `source` to `destination`.
    pub fn draw_flow(&self, source: &str, destination: &str) {
        self.ctrl.set_flow_drawing(true);
        self.click(&[source, destination]);
    }

    pub fn edge_row(&self, id: &str) -> Option<EdgeRow> {
        (0..self.edges.row_count())
            .filter_map(|i| self.edges.row_data(i))
            .find(|row| row.id == id)
    }

    /// Ids of edges the view currently draws animated, in model order.
    pub fn animated_edges(&self) -> Vec<String> {
        (0..self.edges.row_count())
            .filter_map(|i| self.edges.row_data(i))
            .filter(|row| row.animated)
            .map(|row| row.id.to_string())
            .collect()
    }

    pub fn flow_rows(&self) -> Vec<FlowRow> {
        (0..self.flows.row_count())
            .filter_map(|i| self.flows.row_data(i))
            .collect()
    }
}
