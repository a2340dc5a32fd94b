//! The canonical holon entity shared by the graph and tree projections.
//!
//! A [`Holon`] is identified by a string id and carries a label plus an
//! optional description. The graph view wraps it with a display position
//! ([`crate::graph::Node`]); the tree view wraps it with owned children
//! ([`crate::tree::TreeNode`]). Both serialize to the same
//! `{ "id": .., "data": { "label": .., "description": .. } }` shape.

use serde::{Deserialize, Serialize};

/// Identifier of a holon. Unique within one projection.
pub type HolonId = String;

/// Editable payload of a holon.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolonData {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HolonData {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named entity: stakeholder, infrastructure element, or generic node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holon {
    pub id: HolonId,
    pub data: HolonData,
}

impl Holon {
    pub fn new(id: impl Into<HolonId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: HolonData::new(label),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.data.description = Some(description.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }
}

/// Cosmetic display position in world coordinates.
///
/// Only `y` carries meaning for the core: it stands in for hierarchical depth
/// in the level-tolerance check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
