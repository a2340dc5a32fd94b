//! Validation of information-flow connect attempts.
//!
//! Each rule implements [`FlowValidator`]; rules compose with
//! [`CompositeValidator`], which short-circuits on the first failure.

use crate::flows::InformationFlow;
use crate::graph::GraphStore;
use crate::holon::HolonId;
use thiserror::Error;

/// Result of flow validation with optional rejection reason
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Combine two results (AND logic): returns first error if any
    pub fn and(self, other: ValidationResult) -> ValidationResult {
        match self {
            ValidationResult::Valid => other,
            invalid => invalid,
        }
    }
}

/// Reasons a connect attempt was refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Holon {0} not found")]
    NodeNotFound(HolonId),

    #[error("Cannot connect a holon to itself")]
    SameNode,

    #[error("Source and destination nodes must be on the same level.")]
    LevelMismatch { delta: f32, tolerance: f32 },

    #[error("Information flow already exists")]
    DuplicateFlow,

    #[error("{0}")]
    Custom(String),
}

impl ValidationError {
    /// Whether the rejection should be shown to the user.
    ///
    /// Missing endpoints, self-connections and duplicates are structural
    /// no-ops and are dropped silently.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::LevelMismatch { .. } | Self::Custom(_))
    }
}

/// A rule deciding whether `source_id → destination_id` may become a flow.
pub trait FlowValidator {
    fn validate(
        &self,
        source_id: &str,
        destination_id: &str,
        graph: &GraphStore,
        flows: &[InformationFlow],
    ) -> ValidationResult;
}

/// Both endpoints must be live graph nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExistingEndpointsValidator;

impl FlowValidator for ExistingEndpointsValidator {
    fn validate(
        &self,
        source_id: &str,
        destination_id: &str,
        graph: &GraphStore,
        _flows: &[InformationFlow],
    ) -> ValidationResult {
        for id in [source_id, destination_id] {
            if !graph.contains(id) {
                return ValidationResult::Invalid(ValidationError::NodeNotFound(id.to_string()));
            }
        }
        ValidationResult::Valid
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DistinctEndpointsValidator;

impl FlowValidator for DistinctEndpointsValidator {
    fn validate(
        &self,
        source_id: &str,
        destination_id: &str,
        _graph: &GraphStore,
        _flows: &[InformationFlow],
    ) -> ValidationResult {
        if source_id == destination_id {
            ValidationResult::Invalid(ValidationError::SameNode)
        } else {
            ValidationResult::Valid
        }
    }
}

/// Endpoints must sit at (roughly) the same vertical display coordinate.
///
/// The y coordinate stands in for hierarchical depth in the graph view.
#[derive(Clone, Copy, Debug)]
pub struct LevelToleranceValidator {
    tolerance: f32,
}

impl LevelToleranceValidator {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }
}

impl FlowValidator for LevelToleranceValidator {
    fn validate(
        &self,
        source_id: &str,
        destination_id: &str,
        graph: &GraphStore,
        _flows: &[InformationFlow],
    ) -> ValidationResult {
        let (Some(source), Some(destination)) = (graph.node(source_id), graph.node(destination_id))
        else {
            // Existence is another rule's concern
            return ValidationResult::Valid;
        };

        let delta = (source.position.y - destination.position.y).abs();
        // A non-finite coordinate is never on any level
        if !delta.is_finite() || delta > self.tolerance {
            ValidationResult::Invalid(ValidationError::LevelMismatch {
                delta,
                tolerance: self.tolerance,
            })
        } else {
            ValidationResult::Valid
        }
    }
}

/// Rejects an ordered pair that is already stored. Direction matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDuplicateFlowValidator;

impl FlowValidator for NoDuplicateFlowValidator {
    fn validate(
        &self,
        source_id: &str,
        destination_id: &str,
        _graph: &GraphStore,
        flows: &[InformationFlow],
    ) -> ValidationResult {
        if flows.iter().any(|f| f.connects(source_id, destination_id)) {
            ValidationResult::Invalid(ValidationError::DuplicateFlow)
        } else {
            ValidationResult::Valid
        }
    }
}

/// Runs validators in insertion order and returns the first failure.
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn FlowValidator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard pipeline: endpoints exist, are distinct, are on the same
    /// level (when `level_tolerance` is set), and are not already connected.
    pub fn standard(level_tolerance: Option<f32>) -> Self {
        let mut composite = Self::new()
            .add(ExistingEndpointsValidator)
            .add(DistinctEndpointsValidator);
        if let Some(tolerance) = level_tolerance {
            composite = composite.add(LevelToleranceValidator::new(tolerance));
        }
        composite.add(NoDuplicateFlowValidator)
    }

    pub fn add<V: FlowValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl FlowValidator for CompositeValidator {
    fn validate(
        &self,
        source_id: &str,
        destination_id: &str,
        graph: &GraphStore,
        flows: &[InformationFlow],
    ) -> ValidationResult {
        for v in &self.validators {
            let result = v.validate(source_id, destination_id, graph, flows);
            if !result.is_valid() {
                return result;
            }
        }
        ValidationResult::Valid
    }
}

// ============================================================================
// Tests
// ============================================================================
