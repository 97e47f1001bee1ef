//! # Validation Engine Trait
//!
//! The decoder is written against [`ShapeValidator`] rather than a concrete
//! engine. [`Validator`](crate::Validator) is the engine shipped with this
//! crate; tests substitute validators that return hand-built witnesses.

use thiserror::Error;

use oxrdf::Term;

use crate::failure::ValidationFailure;
use crate::schema::ShapeLabel;
use crate::witness::Witness;

/// Why a validation call produced no witness.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The node does not satisfy the shape.
    #[error(transparent)]
    Failure(Box<ValidationFailure>),

    /// The shape label is not declared.
    #[error("unknown shape {0}")]
    UnknownShape(ShapeLabel),

    /// Shape references nested deeper than the configured limit.
    #[error("shape reference depth limit of {limit} exceeded")]
    DepthLimitExceeded {
        /// Configured limit.
        limit: usize,
    },
}

impl From<ValidationFailure> for EngineError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Failure(Box::new(failure))
    }
}

/// A validation engine bound to one constraint schema and one graph.
pub trait ShapeValidator {
    /// Check `node` against the shape declared under `shape`.
    fn validate(&mut self, node: &Term, shape: &ShapeLabel) -> Result<Witness, EngineError>;
}
