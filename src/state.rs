use crate::config::PathMembership;
use crate::graph::Edge;
use crate::holon::HolonId;
use crate::path::{path_edge_ids, runs_forward};
use slint::Color;
use std::collections::HashMap;

/// Border decoration of a node taking part in a flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeBorder {
    #[default]
    None,
    Source,
    Destination,
}

/// Which way an arrow marker points relative to the edge's own direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerOrient {
    Auto,
    AutoStartReverse,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowMarker {
    pub color: Color,
    pub orient: MarkerOrient,
    pub size: f32,
}

/// Derived rendering state of one edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
    pub animated: bool,
    pub stroke: Color,
    pub dashed: bool,
    pub marker: Option<ArrowMarker>,
}

impl EdgeStyle {
    pub fn is_highlighted(&self) -> bool {
        self.marker.is_some()
    }
}

/// Colors used for flow highlighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightPalette {
    pub flow: Color,
    pub neutral: Color,
    pub source: Color,
    pub destination: Color,
    pub marker_size: f32,
}

impl Default for HighlightPalette {
    fn default() -> Self {
        Self {
            flow: Color::from_rgb_u8(0, 128, 0),
            neutral: Color::from_rgb_u8(0, 0, 0),
            source: Color::from_rgb_u8(0, 0, 255),
            destination: Color::from_rgb_u8(0, 128, 0),
            marker_size: 20.0,
        }
    }
}

impl HighlightPalette {
    pub fn border_color(&self, border: NodeBorder) -> Option<Color> {
        match border {
            NodeBorder::None => None,
            NodeBorder::Source => Some(self.source),
            NodeBorder::Destination => Some(self.destination),
        }
    }
}

/// One additive set of highlighted edges and decorated nodes.
///
/// Edge entries map edge id → "runs forward along the path".
#[derive(Clone, Debug, Default)]
struct Layer {
    edges: HashMap<String, bool>,
    borders: HashMap<HolonId, NodeBorder>,
}

impl Layer {
    fn clear(&mut self) {
        self.edges.clear();
        self.borders.clear();
    }

    fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.borders.is_empty()
    }
}

/// Selects which overlay layer an operation writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayLayer {
    /// Highlights from show-all / show-one / show-for-node. Cleared only by
    /// an explicit reset.
    Sticky,
    /// Decoration of an in-progress or just-committed connection. Cleared by
    /// the delayed post-commit reset, leaving flow mode, or a pane click.
    Provisional,
}

/// Accumulated highlight state of the graph view.
///
/// Highlighting is additive: marking a new path never un-marks edges from an
/// earlier one. Styles are derived on demand from the layers so the view can
/// re-render from scratch at any time.
#[derive(Clone, Debug, Default)]
pub struct HighlightOverlay {
    sticky: Layer,
    provisional: Layer,
    palette: HighlightPalette,
}

impl HighlightOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn palette(&self) -> &HighlightPalette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: HighlightPalette) {
        self.palette = palette;
    }

    /// Mark every edge judged to lie on `path`.
    ///
    /// Returns the number of edges newly or re-marked.
    pub fn mark_path(
        &mut self,
        edges: &[Edge],
        path: &[HolonId],
        membership: PathMembership,
        layer: OverlayLayer,
    ) -> usize {
        let in_path = path_edge_ids(edges, path, membership);
        let target = self.layer_mut(layer);
        for edge in edges.iter().filter(|e| in_path.contains(&e.id.as_str())) {
            target.edges.insert(edge.id.clone(), runs_forward(edge, path));
        }
        in_path.len()
    }

    pub fn set_border(&mut self, node_id: &str, border: NodeBorder, layer: OverlayLayer) {
        let target = self.layer_mut(layer);
        if border == NodeBorder::None {
            target.borders.remove(node_id);
        } else {
            target.borders.insert(node_id.to_string(), border);
        }
    }

    pub fn clear_provisional(&mut self) {
        self.provisional.clear();
    }

    /// Clear all highlighting back to neutral.
    pub fn reset(&mut self) {
        self.sticky.clear();
        self.provisional.clear();
    }

    /// Drop all decoration referring to a node or edge that no longer exists.
    pub fn forget_edge(&mut self, edge_id: &str) {
        self.sticky.edges.remove(edge_id);
        self.provisional.edges.remove(edge_id);
    }

    pub fn forget_node(&mut self, node_id: &str) {
        self.sticky.borders.remove(node_id);
        self.provisional.borders.remove(node_id);
    }

    pub fn is_empty(&self) -> bool {
        self.sticky.is_empty() && self.provisional.is_empty()
    }

    pub fn is_edge_highlighted(&self, edge_id: &str) -> bool {
        self.sticky.edges.contains_key(edge_id) || self.provisional.edges.contains_key(edge_id)
    }

    /// Ids of all highlighted edges, sorted.
    pub fn highlighted_edges(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .sticky
            .edges
            .keys()
            .chain(self.provisional.edges.keys())
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Derived style for an edge.
    ///
    /// Sticky highlights are drawn dashed with a direction-aware arrow;
    /// provisional ones solid with a plain arrow.
    pub fn edge_style(&self, edge_id: &str) -> EdgeStyle {
        if let Some(&forward) = self.sticky.edges.get(edge_id) {
            return self.flow_style(true, forward);
        }
        if self.provisional.edges.contains_key(edge_id) {
            return self.flow_style(false, true);
        }
        EdgeStyle {
            animated: false,
            stroke: self.palette.neutral,
            dashed: false,
            marker: None,
        }
    }

    /// Border of a node; provisional decoration wins over sticky.
    pub fn node_border(&self, node_id: &str) -> NodeBorder {
        self.provisional
            .borders
            .get(node_id)
            .or_else(|| self.sticky.borders.get(node_id))
            .copied()
            .unwrap_or_default()
    }

    fn flow_style(&self, dashed: bool, forward: bool) -> EdgeStyle {
        EdgeStyle {
            animated: true,
            stroke: self.palette.flow,
            dashed,
            marker: Some(ArrowMarker {
                color: self.palette.flow,
                orient: if forward {
                    MarkerOrient::Auto
                } else {
                    MarkerOrient::AutoStartReverse
                },
                size: self.palette.marker_size,
            }),
        }
    }

    fn layer_mut(&mut self, layer: OverlayLayer) -> &mut Layer {
        match layer {
            OverlayLayer::Sticky => &mut self.sticky,
            OverlayLayer::Provisional => &mut self.provisional,
        }
    }
}
