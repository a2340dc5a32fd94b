//! # Holon Flow Editor
//!
//! State and logic behind a Slint holon editor: a strict hierarchical tree
//! and a free-form directed graph of named entities ("holons"), with directed
//! information flows whose shortest connecting paths are highlighted.
//!
//! ## Features
//!
//! - **One Entity, Two Projections** - [`Holon`] is shared by the graph view
//!   ([`GraphStore`]) and the tree view ([`TreeProjection`])
//! - **Shortest-Path Highlighting** - breadth-first [`find_path`] over the
//!   undirected edge set, drawn as an additive [`HighlightOverlay`]
//! - **Validated Flows** - composable [`FlowValidator`] rules (level
//!   tolerance, duplicates, ...) guard every connect attempt
//! - **Flat JSON Exchange** - flows export to and import from
//!   `[[source, destination], ...]`
//! - **Slint Bindings** - callback factories and `VecModel` sync helpers on
//!   [`HolonEditorController`]
//!
//! ## Rust Helpers
//!
//! - [`GraphStore`] - Node/edge CRUD with cascading delete
//! - [`find_path`] - Shortest node-id path between two holons
//! - [`FlowManager`] - Flow storage, highlighting and import/export
//! - [`SelectionController`] - Flow-drawing click state machine
//! - [`TreeProjection`] - Tree CRUD (add child, add parent, cascading remove)
//! - [`HolonEditorController`] - Wires everything to the view layer
//!
//! Logging goes through the `log` facade; install any logger to see it.

pub mod config;
pub mod controller;
pub mod error;
pub mod flows;
pub mod graph;
pub mod holon;
pub mod path;
pub mod selection;
pub mod state;
pub mod tree;
pub mod validation;

pub use config::{EditorConfig, PathMembership, DEFAULT_LEVEL_TOLERANCE, DEFAULT_RESET_DELAY_MS};
pub use controller::{
    ChangeKind, ConnectOutcome, HolonEditorController, ResetScheduler, SlintTimerScheduler,
};
pub use error::{ConfigError, ImportError};
pub use flows::{FlowCommit, FlowEndpoint, FlowKey, FlowManager, InformationFlow, NodeSnapshot};
pub use graph::{Edge, GraphStore, Node, NodeUpdate};
pub use holon::{Holon, HolonData, HolonId, Position};
pub use path::{find_path, path_edge_ids};
pub use selection::{ClickOutcome, ResetTicket, SelectionController, SelectionState};
pub use state::{
    ArrowMarker, EdgeStyle, HighlightOverlay, HighlightPalette, MarkerOrient, NodeBorder,
    OverlayLayer,
};
pub use tree::{TreeNode, TreeProjection};
pub use validation::{
    CompositeValidator, DistinctEndpointsValidator, ExistingEndpointsValidator, FlowValidator,
    LevelToleranceValidator, NoDuplicateFlowValidator, ValidationError, ValidationResult,
};
